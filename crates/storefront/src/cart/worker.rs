//! Cart worker task.
//!
//! Consumes commands from the reconciler channel one at a time. The worker
//! never starts a remote call before the previous one has returned, and only
//! replaces its snapshot with a cart the platform acknowledged. Exits when
//! every handle has been dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lookout_core::{
    Cart, CartHandle, CartLineId, CurrencyCode, OrderSummary, ProductId, VariantId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

use super::{CartBackend, CartError, Reply};

/// Commands accepted by the worker.
#[derive(Debug)]
pub enum Command {
    EnsureCart {
        reply: Reply<CartHandle>,
    },
    AddOrIncrement {
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
        reply: Reply<Cart>,
    },
    SetQuantity {
        line_id: CartLineId,
        quantity: i64,
        reply: Reply<Option<Cart>>,
    },
    AdjustQuantity {
        line_id: CartLineId,
        delta: i64,
        reply: Reply<Option<Cart>>,
    },
    Remove {
        line_id: CartLineId,
        reply: Reply<Option<Cart>>,
    },
    Summarize {
        reply: Reply<(u64, OrderSummary)>,
    },
    CheckoutUrl {
        reply: Reply<Url>,
    },
}

/// Owner of the session's cart state.
pub struct CartWorker<B> {
    backend: Arc<B>,
    timeout: Duration,
    /// Last cart the platform acknowledged.
    cart: Option<Cart>,
    /// Fetched once per cart, never invalidated.
    checkout_url: Option<Url>,
    /// Number of summaries produced so far.
    revision: u64,
}

impl<B: CartBackend> CartWorker<B> {
    pub const fn new(backend: Arc<B>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            cart: None,
            checkout_url: None,
            revision: 0,
        }
    }

    /// Run until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        debug!("Cart worker started");

        while let Some(command) = rx.recv().await {
            self.handle(command).await;
        }

        debug!(
            cart_id = self.cart.as_ref().map(|c| c.id.to_string()),
            "Cart channel closed, worker stopping"
        );
    }

    async fn handle(&mut self, command: Command) {
        // A dropped receiver means the caller stopped waiting, which is fine
        match command {
            Command::EnsureCart { reply } => {
                let _ = reply.send(self.ensure_cart().await);
            }
            Command::AddOrIncrement {
                product_id,
                variant_id,
                quantity,
                reply,
            } => {
                let result = self
                    .add_or_increment(product_id, variant_id, quantity)
                    .await;
                let _ = reply.send(result);
            }
            Command::SetQuantity {
                line_id,
                quantity,
                reply,
            } => {
                let _ = reply.send(self.set_quantity(line_id, quantity).await);
            }
            Command::AdjustQuantity {
                line_id,
                delta,
                reply,
            } => {
                let _ = reply.send(self.adjust_quantity(line_id, delta).await);
            }
            Command::Remove { line_id, reply } => {
                let _ = reply.send(self.remove(line_id).await);
            }
            Command::Summarize { reply } => {
                let result = self.summarize().await.map(|summary| {
                    self.revision += 1;
                    (self.revision, summary)
                });
                let _ = reply.send(result);
            }
            Command::CheckoutUrl { reply } => {
                let _ = reply.send(self.checkout_url().await);
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ShopifyError>>,
    ) -> Result<T, CartError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ShopifyError::Timeout(self.timeout.as_secs()).into()),
        }
    }

    /// Record an acknowledged cart as the new snapshot.
    fn acknowledge(&mut self, cart: Cart) -> Cart {
        if self.cart.as_ref().is_some_and(|current| current.id != cart.id) {
            self.checkout_url = None;
        }
        self.cart = Some(cart.clone());
        cart
    }

    #[instrument(skip(self))]
    async fn ensure_cart(&mut self) -> Result<CartHandle, CartError> {
        if let Some(cart) = &self.cart {
            return Ok(cart.handle());
        }

        let cart = self.bounded(self.backend.create_cart(Vec::new())).await?;
        info!(cart_id = %cart.id, "Cart created");
        Ok(self.acknowledge(cart).handle())
    }

    #[instrument(skip(self), fields(cart_id))]
    async fn add_or_increment(
        &mut self,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let Some(current) = &self.cart else {
            // First add creates the cart with the line in one round trip
            let line = CartLineInput::new(variant_id.as_str(), quantity);
            let cart = self.bounded(self.backend.create_cart(vec![line])).await?;
            tracing::Span::current().record("cart_id", cart.id.as_str());
            info!("Cart created with first line");
            return Ok(self.acknowledge(cart));
        };
        tracing::Span::current().record("cart_id", current.id.as_str());

        let cart_id = current.id.clone();
        let cart = match current.line_for(&product_id, &variant_id) {
            Some(line) => {
                let update = CartLineUpdateInput::new(
                    line.line_id.as_str(),
                    line.quantity.saturating_add(quantity),
                );
                self.bounded(self.backend.update_lines(&cart_id, vec![update]))
                    .await?
            }
            None => {
                let line = CartLineInput::new(variant_id.as_str(), quantity);
                self.bounded(self.backend.add_lines(&cart_id, vec![line]))
                    .await?
            }
        };

        Ok(self.acknowledge(cart))
    }

    #[instrument(skip(self))]
    async fn set_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: i64,
    ) -> Result<Option<Cart>, CartError> {
        if quantity <= 0 {
            return self.remove(line_id).await;
        }

        let Some(current) = &self.cart else {
            return Err(CartError::LineNotFound(line_id));
        };
        if current.line(&line_id).is_none() {
            return Err(CartError::LineNotFound(line_id));
        }

        let cart_id = current.id.clone();
        let update = CartLineUpdateInput::new(line_id.as_str(), clamp_quantity(quantity));
        let cart = self
            .bounded(self.backend.update_lines(&cart_id, vec![update]))
            .await?;
        Ok(Some(self.acknowledge(cart)))
    }

    #[instrument(skip(self))]
    async fn adjust_quantity(
        &mut self,
        line_id: CartLineId,
        delta: i64,
    ) -> Result<Option<Cart>, CartError> {
        let current = self
            .cart
            .as_ref()
            .and_then(|cart| cart.line(&line_id))
            .map(|line| i64::from(line.quantity));

        match current {
            Some(quantity) => self.set_quantity(line_id, quantity.saturating_add(delta)).await,
            None if delta <= 0 => {
                debug!("Decrement on a line that is already gone");
                Ok(self.cart.clone())
            }
            None => Err(CartError::LineNotFound(line_id)),
        }
    }

    #[instrument(skip(self))]
    async fn remove(&mut self, line_id: CartLineId) -> Result<Option<Cart>, CartError> {
        let Some(current) = &self.cart else {
            return Ok(None);
        };
        if current.line(&line_id).is_none() {
            debug!("Line already removed");
            return Ok(Some(current.clone()));
        }

        let cart_id = current.id.clone();
        let cart = self
            .bounded(self.backend.remove_lines(&cart_id, vec![line_id]))
            .await?;
        Ok(Some(self.acknowledge(cart)))
    }

    #[instrument(skip(self))]
    async fn summarize(&mut self) -> Result<OrderSummary, CartError> {
        let Some(current) = &self.cart else {
            return Ok(OrderSummary::empty(CurrencyCode::default()));
        };

        let cart_id = current.id.clone();
        let currency = current.cost.total.currency_code;
        match self.bounded(self.backend.cart(&cart_id)).await? {
            Some(cart) => Ok(OrderSummary::from_cart(&self.acknowledge(cart))),
            None => {
                warn!(cart_id = %cart_id, "Cart no longer exists, starting over");
                self.cart = None;
                self.checkout_url = None;
                Ok(OrderSummary::empty(currency))
            }
        }
    }

    #[instrument(skip(self))]
    async fn checkout_url(&mut self) -> Result<Url, CartError> {
        if let Some(url) = &self.checkout_url {
            return Ok(url.clone());
        }

        let Some(current) = &self.cart else {
            return Err(CartError::NoCart);
        };

        let raw = if current.checkout_url.is_empty() {
            let cart_id = current.id.clone();
            let cart = self
                .bounded(self.backend.cart(&cart_id))
                .await?
                .ok_or(CartError::NoCart)?;
            self.acknowledge(cart).checkout_url
        } else {
            current.checkout_url.clone()
        };

        let url = Url::parse(&raw).map_err(|e| CartError::CheckoutUrl(e.to_string()))?;
        self.checkout_url = Some(url.clone());
        Ok(url)
    }
}

/// Quantities above `u32::MAX` are clamped; the platform rejects them anyway.
fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(3), 3);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }
}
