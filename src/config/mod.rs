//! Configuration module

mod site;

pub use site::ClassConfig;
pub use site::HighlightConfig;
pub use site::RenderConfig;
pub use site::SiteConfig;
