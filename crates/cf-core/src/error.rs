use thiserror::Error;

pub type CfResult<T> = Result<T, CfError>;

#[derive(Error, Debug)]
pub enum CfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
