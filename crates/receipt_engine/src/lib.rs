//! Receipt engine: IO behind the receipt screens and effect execution.
mod engine;
mod fetch;
mod keys;
mod logo;
mod persist;
mod qr;
mod timer;
mod types;

pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use fetch::{FetchSettings, FetchedBody, PreviewClient, ReqwestPreviewClient};
pub use keys::{
    hash_terminal_key, provision_terminal_key, KeyError, ProvisionedKey, KEY_BYTES,
    KEY_PREFIX_LEN, PEPPER_ENV,
};
pub use logo::{HttpLogoSource, Logo, LogoSource, StaticLogo};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use qr::{svg_data_url, QrRenderer, SvgQrRenderer};
pub use timer::dismiss_after;
pub use types::{EngineEvent, FailureKind, FetchError, QrError};
