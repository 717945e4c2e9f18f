#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read catalog file: {0}")]
    CatalogRead(std::io::Error),
    #[error("failed to parse catalog: {0}")]
    CatalogParse(serde_json::Error),
    #[error("failed to read keyword map file: {0}")]
    KeywordMapRead(std::io::Error),
    #[error("failed to parse keyword map: {0}")]
    KeywordMapParse(serde_json::Error),
    #[error("failed to read waiver rules file: {0}")]
    WaiverRulesRead(std::io::Error),
    #[error("failed to parse waiver rules: {0}")]
    WaiverRulesParse(serde_json::Error),
    #[error("duplicate service id {0} in catalog")]
    DuplicateServiceId(u32),
    #[error("service {0} has a negative price")]
    NegativePrice(u32),
    #[error("fee service {0} is missing a fee type key")]
    MissingFeeType(u32),
    #[error("unknown service id {0}")]
    UnknownService(u32),
    #[error("service {0} is a fee and is applied automatically, not added directly")]
    FeeNotAddable(u32),
    #[error("failed to serialize cart: {0}")]
    CartSerialization(serde_json::Error),
    #[error("failed to deserialize cart: {0}")]
    CartDeserialization(serde_json::Error),
}

pub type CheckoutResult<T> = std::result::Result<T, CheckoutError>;
