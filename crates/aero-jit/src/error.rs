/// Recoverable failures this crate surfaces to an embedding host.
///
/// The lifecycle operations named by the upward contract (`CreatePath`,
/// `AddPath`, ...) keep their `bool` return values — that's a named part of
/// the contract, not an omission. The zero-guest-pc and already-active-path
/// cases from §7's error table are a plain `bool` return and an
/// `assert!`-backed invariant respectively, not recoverable `Result`s, so
/// they have no variant here; only `ensure_ender`'s arena acquisition is.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("jit arena failed to acquire a block: {0}")]
    ArenaAcquisition(#[from] aero_jit_x86::JitError),
}
