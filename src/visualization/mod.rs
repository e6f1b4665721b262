pub mod status;
pub mod text_plots;

pub use status::{StatusSink, TextPlotStatus};
pub use text_plots::plot_series;
