pub use crate::data_structs::{
    Category,
    ContingencyTable,
    EnrichmentResult,
    EntityDatabase,
    Method,
    Order,
    PValue,
    PValueMode,
    Score,
    Scores,
    SharedDatabase,
    Tail,
    Variance,
};
pub use crate::error::{
    EnrichError,
    Result,
};
pub use crate::tools::hypothesis::{
    fisher_exact,
    Binomial,
    Hypergeometric,
    TestOutcome,
};
pub use crate::tools::{
    EnrichmentAlgorithm,
    EnrichmentConfig,
    OverRepresentationAnalysis,
    PermutationOutcome,
    PermutationTest,
    RunningSum,
    SetStatistic,
};
