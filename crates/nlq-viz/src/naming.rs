//! Output filename convention for rendered charts (§4.8): `chart_<yyyymmdd_hhmmss>.png`.

use chrono::{DateTime, Utc};

pub fn chart_filename(created_at: DateTime<Utc>) -> String {
    format!("chart_{}.png", created_at.format("%Y%m%d_%H%M%S"))
}
