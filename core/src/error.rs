use thiserror::Error;

/// Failures surfaced while loading levels, classifying meshes or registering actors.
///
/// Tick-time operations never return these; out-of-range reads during a tick
/// resolve to "blocked" instead.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CrawlerError {
    /// A required mesh classification bucket or tuning value is missing.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A coordinate fell outside the level bounds.
    #[error("cell ({x}, {y}) lies outside the {width}x{height} level")]
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
        /// Level width in cells.
        width: u32,
        /// Level height in cells.
        height: u32,
    },
    /// A load-time invariant the collision model depends on does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// An actor definition named a type the factory does not know.
    #[error("no actor constructor registered for type `{0}`")]
    UnknownActorType(String),
    /// Two constructors were registered under the same type tag.
    #[error("actor type `{0}` registered twice")]
    DuplicateActorType(String),
    /// Level data does not match its declared dimensions.
    #[error("malformed level: {0}")]
    MalformedLevel(String),
}
