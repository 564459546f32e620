//! Result view: statistics, class visibility, overlay geometry and painting.

pub mod html;
pub mod overlay;
pub mod session;
pub mod stats;
pub mod visibility;

pub use html::{render_document, write_document};
pub use overlay::{color_for_class, render_overlay, ClassColor, Overlay, OverlayBox, Rgb, PALETTE};
pub use session::{Phase, RequestToken, ResultView, StatsRow, ViewSnapshot};
pub use stats::{aggregate, StatsEntry};
pub use visibility::VisibilitySet;
