//! Print the dashboard views of the built-in sample week

use dayflux::encoder::SnapshotEncoder;
use dayflux::{DashboardConfig, DashboardProcessor, TimeRange};

fn main() {
    let mut processor = match DashboardProcessor::sample(DashboardConfig::default()) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return;
        }
    };

    let Some(last) = processor.last_date() else {
        return;
    };
    match processor.context(last) {
        Ok(context) => println!(
            "{last}: {} h sleep, {} min outdoors ({:?})",
            context.day.sleep_hours, context.day.outdoor_minutes, context.outdoor_intensity
        ),
        Err(e) => eprintln!("Error: {e:?}"),
    }

    let sleep = match processor.category("sleep") {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return;
        }
    };

    match SnapshotEncoder::new().encode_to_json(&mut processor, sleep, TimeRange::All) {
        Ok(json) => print!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
