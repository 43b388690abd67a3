use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// A firm whose wage does not sit strictly below its productivity.
    /// The sampler clamps wages to `productivity - 1`, so this only fires
    /// when the productivity draw itself is at or below the wage floor.
    #[error("degenerate market: firm {firm} has wage {wage} >= productivity {productivity}")]
    DegenerateMarket {
        firm: usize,
        productivity: f64,
        wage: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid distribution for {field}: {source}")]
    Distribution {
        field: &'static str,
        #[source]
        source: rand_distr::NormalError,
    },

    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
