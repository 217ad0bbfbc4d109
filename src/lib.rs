pub mod sdk;

pub use sdk::batch::{BatchAggregator, BatchOutcome, Notice, NoticeLevel, RenderItem};
pub use sdk::config::{AppConfig, ConfigError, MapConfig, OrsConfig, RoutingSettings};
pub use sdk::export::{ReportExporter, DEFAULT_FILE_NAME, PDF_MIME_TYPE};
pub use sdk::geo::{Coordinate, GeoExtent, ValidationError};
pub use sdk::map::{BlankTileSource, Canvas, MapComposer, OsmTileSource, RenderError, TileSource};
pub use sdk::pairs::{
    LoadError, ManualPairs, OdPair, PairId, PairLoad, PairSource, ParseError, RowRejection,
    TabularFormat, TabularPairs, MAX_MANUAL_PAIRS,
};
pub use sdk::report::ReportRow;
pub use sdk::routing::{
    LocalOrsProvider, RemoteOrsProvider, RouteError, RouteResult, RouteSummary, RoutingError,
    RoutingProvider,
};
