pub mod inventory;
pub use inventory::{InventoryError, OwnedSet, build_owned};

pub mod metadata;
pub use metadata::{MetadataError, MetadataService};

pub mod output;
pub use output::{FileOutput, ResultSink};

pub mod reconcile;
pub use reconcile::{Collaborators, Reconciler, RunOptions, RunOutcome, RunReport};

pub mod registry;
pub use registry::{MovieIdx, MovieRegistry};

pub mod run_handle;
pub use run_handle::{RunHandle, RunStatus};

pub mod supervisor;
pub use supervisor::{
    SearchError, SearchSupervisor, StartedRun, SupervisorSettings, check_preconditions,
};

pub mod throttle;
pub use throttle::{CallWeight, Cancelled, Throttle};

pub mod tmdb_list;
pub use tmdb_list::{ExternalList, ListReport, TmdbList};
