mod health_check;
mod home;
mod newsletter;

pub use health_check::*;
pub use home::*;
pub use newsletter::*;

/// Print an error followed by every error in its `source` chain. Used for the
/// `Debug` impls of handler errors, so that logs show the root cause.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
