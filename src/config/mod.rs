//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::CommentsConfig;
pub use site::PreviewConfig;
pub use site::SiteConfig;
pub use site::{ENV_CMS_ENDPOINT, ENV_CMS_TOKEN, ENV_COMMENTS_REPO};
