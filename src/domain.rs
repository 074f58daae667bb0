// ドメイン層
// ビジネスルールと外部依存の抽象（ポート）を定義する

pub mod error;
pub mod model;
pub mod port;
