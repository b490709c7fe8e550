pub mod json;
pub mod page;
pub mod rss;

pub use json::JsonPublisher;
pub use page::PagePublisher;
pub use rss::RssPublisher;

use crate::config::PlanetConfig;
use crate::traits::Publisher;

/// The publishers every run hands its posts to, in order.
pub fn default_publishers(config: &PlanetConfig) -> Vec<Box<dyn Publisher>> {
    vec![
        Box::new(RssPublisher::new(
            config.planet.title.clone(),
            config.planet.link.clone(),
            config.planet.description.clone(),
        )),
        Box::new(PagePublisher::new(
            config.planet.title.clone(),
            config.planet.description.clone(),
        )),
        Box::new(JsonPublisher),
    ]
}
