/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 無効な数量（例: 0以下の数量）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 注文の検証失敗（例: 注文明細が空）
    #[error("Order validation failed: {0}")]
    OrderValidation(String),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// 金額の計算が表現可能な範囲を超えた
    #[error("Amount overflow")]
    AmountOverflow,
}
