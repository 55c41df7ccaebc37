/// A logical address flowing through the fetch matrix and line index.
///
/// Signed so that the padding sentinel ([`SENTINEL`]) can share the same
/// representation as a real address instead of requiring an `Option` at
/// every call site in the hot servicing loop.
pub type Address = i64;

/// Padding value used to fill fetch-matrix rows that are shorter than the
/// backing bandwidth. Never a valid address and never inserted into a line's
/// address set.
pub const SENTINEL: Address = -1;
