//! Plain media records, registered with [`register_media_types`].

use crate::{Any, Reflect, Registry};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Reflect)]
pub struct Image {
    pub url: String,
    pub width: i64,
    pub height: i64,
    pub format: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Reflect)]
pub struct Video {
    pub url: String,
    pub format: String,
    pub duration: i64,
    pub size: i64,
    /// Cover image
    pub image: Option<Image>,
}

/// Titled, ordered collection of arbitrary envelopes.
#[derive(Clone, Debug, Default, PartialEq, Reflect)]
pub struct Gallery {
    pub title: String,
    pub items: Vec<Any>,
}

pub fn register_media_types(registry: &Registry) {
    registry.register::<Image>();
    registry.register::<Video>();
    registry.register::<Gallery>();
}

#[cfg(test)]
mod tests {
    use super::{register_media_types, Gallery, Image, Video};
    use crate::{Kind, Registry};

    #[test]
    fn identifiers_follow_module_path() {
        let registry = Registry::new();
        register_media_types(&registry);
        assert!(registry.contains("anybox::media::Image"));
        assert!(registry.contains("anybox::media::Video"));
        let gallery = registry.descriptor_for("anybox::media::Gallery").unwrap();
        assert_eq!(gallery.kind(), Kind::Struct);
        let items = &gallery.fields()[1];
        assert_eq!(items.name(), "items");
        assert!(items.is_envelope());
        assert!(!gallery.fields()[0].is_envelope());
    }

    #[test]
    fn zero_values() {
        let registry = Registry::new();
        register_media_types(&registry);
        let zero = registry.descriptor_for("anybox::media::Video").unwrap().zero_value();
        assert_eq!(zero.as_ref().as_any().downcast_ref::<Video>(), Some(&Video::default()));
        assert_eq!(Image::default().width, 0);
        assert!(Gallery::default().items.is_empty());
    }
}
