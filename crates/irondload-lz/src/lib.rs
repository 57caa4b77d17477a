#![doc = "Streaming decompressor for the LG/Qualcomm download-mode EMMC read stream"]
#![doc(html_logo_url = "https://cdnweb.devolutions.net/images/projects/devolutions/logos/devolutions-icon-shadow.svg")]

mod decompress;
mod error;
mod window;

pub use decompress::Decompressor;
pub use error::LzError;
pub use window::MAX_WINDOW_SIZE;
