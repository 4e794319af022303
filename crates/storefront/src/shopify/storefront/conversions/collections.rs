//! Collection type conversion functions.

use lookout_core::{Collection, CollectionId, Image};

use crate::shopify::types::{CollectionNode, ImageNode};

pub fn convert_collection(node: CollectionNode) -> Collection {
    Collection {
        id: CollectionId::new(node.id),
        handle: node.handle,
        title: node.title,
        description: node.description,
        image: node.image.map(convert_image),
    }
}

pub fn convert_image(node: ImageNode) -> Image {
    Image {
        url: node.url,
        alt_text: node.alt_text.filter(|alt| !alt.is_empty()),
    }
}
