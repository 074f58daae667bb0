// アプリケーション層
// ユースケースの調整とアクセス制御を担当する

pub mod error;
pub mod identity;
pub mod service;

pub use error::ApplicationError;
pub use identity::Identity;
