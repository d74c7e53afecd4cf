use csv::WriterBuilder;
use pantilt_common::sim::{Event, Stamped};
use std::error::Error;

pub fn export_to_csv(events: &[Stamped]) -> Result<String, Box<dyn Error>> {
    let mut wtr = WriterBuilder::new().from_writer(vec![]);

    wtr.write_record(["at_ms", "event", "axis", "value"])?;

    for stamped in events {
        let at_ms = stamped.at.as_millis().to_string();
        let record = match stamped.event {
            Event::Write { axis, angle } => {
                [at_ms, "write".to_string(), axis.to_string(), angle.to_string()]
            }
            Event::Delay(d) => [
                at_ms,
                "delay".to_string(),
                String::new(),
                d.as_millis().to_string(),
            ],
            Event::Status(on) => [
                at_ms,
                "status".to_string(),
                String::new(),
                (on as u8).to_string(),
            ],
        };
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}
