pub mod answer;
pub mod attempt;
pub mod course;
pub mod enrollment;
pub mod question;
pub mod quiz_package;
pub mod user;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
