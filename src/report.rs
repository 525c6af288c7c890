use anyhow::Result;
use serde::Serialize;

use crate::prober::{AttemptOutcome, OutcomeSink, Target};
use crate::stats::RunSummary;

pub fn banner(host: &str, target: &Target) -> String {
    let original = Target::new(host, target.port);
    if original.address == target.address {
        format!("Sending TCP packets for host {}:", original)
    } else {
        format!("Sending TCP packets for host {} [{}]:", original, target)
    }
}

pub fn outcome_line(outcome: &AttemptOutcome) -> String {
    let peer = Target::new(outcome.host.as_str(), outcome.port);
    if outcome.delivered {
        format!("Request for host {} - time: {} milli-seconds", peer, outcome.delay_millis)
    } else {
        format!("Request for host {} - Connection refused", peer)
    }
}

pub fn summary_block(target: &Target, summary: &RunSummary) -> String {
    let loss = summary
        .loss_percent
        .map_or_else(|| "N/A".to_string(), |p| format!("{}%", p));
    let ms = |v: Option<u64>| v.map_or_else(|| "N/A".to_string(), |v| format!("{}ms", v));
    format!(
        "TCP Ping statistics for [{}]:\n     Packets: Send = {}, Delivered = {}, Lost = {} ({} loss)\nApproximate round trip times in milli-seconds:\n     Minimum = {}, Maximum = {}, Average = {}",
        target,
        summary.sent,
        summary.delivered,
        summary.lost,
        loss,
        ms(summary.min_millis),
        ms(summary.max_millis),
        ms(summary.avg_millis),
    )
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    target: &'a Target,
    cancelled: bool,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

pub fn summary_json(target: &Target, summary: &RunSummary, cancelled: bool) -> Result<String> {
    Ok(serde_json::to_string(&SummaryRecord {
        target,
        cancelled,
        summary,
    })?)
}

/// Prints each outcome to stdout as it arrives, as text or JSON Lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    pub json: bool,
}

impl ConsoleReporter {
    pub fn render(&self, outcome: &AttemptOutcome) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string(outcome)?)
        } else {
            Ok(outcome_line(outcome))
        }
    }

    pub fn print_summary(&self, target: &Target, summary: &RunSummary, cancelled: bool) -> Result<()> {
        if self.json {
            println!("{}", summary_json(target, summary, cancelled)?);
        } else {
            println!("\n{}", summary_block(target, summary));
            if summary.is_empty() {
                println!("     (no attempts completed)");
            }
        }
        Ok(())
    }
}

impl OutcomeSink for ConsoleReporter {
    fn on_outcome(&mut self, outcome: &AttemptOutcome) {
        match self.render(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("cannot render outcome: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::new("93.184.216.34", 80)
    }

    #[test]
    fn banner_shows_resolved_address_only_when_different() {
        assert_eq!(banner("93.184.216.34", &target()), "Sending TCP packets for host 93.184.216.34:80:");
        assert_eq!(
            banner("example.com", &target()),
            "Sending TCP packets for host example.com:80 [93.184.216.34:80]:"
        );
    }

    #[test]
    fn outcome_lines() {
        let mut o = AttemptOutcome {
            host: "93.184.216.34".into(),
            port: 80,
            delivered: true,
            delay_millis: 23,
        };
        assert_eq!(outcome_line(&o), "Request for host 93.184.216.34:80 - time: 23 milli-seconds");
        o.delivered = false;
        assert_eq!(outcome_line(&o), "Request for host 93.184.216.34:80 - Connection refused");
    }

    #[test]
    fn summary_block_fills_values() {
        let s = RunSummary {
            sent: 4,
            delivered: 3,
            lost: 1,
            loss_percent: Some(25),
            min_millis: Some(10),
            max_millis: Some(30),
            avg_millis: Some(20),
        };
        let text = summary_block(&target(), &s);
        assert!(text.contains("Send = 4, Delivered = 3, Lost = 1 (25% loss)"));
        assert!(text.contains("Minimum = 10ms, Maximum = 30ms, Average = 20ms"));
    }

    #[test]
    fn degenerate_summary_renders_na() {
        let text = summary_block(&target(), &RunSummary::default());
        assert!(text.contains("Send = 0, Delivered = 0, Lost = 0 (N/A loss)"));
        assert!(text.contains("Minimum = N/A, Maximum = N/A, Average = N/A"));
    }

    #[test]
    fn json_summary_uses_null_for_missing_values() {
        let line = summary_json(&target(), &RunSummary::default(), true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["sent"], 0);
        assert_eq!(v["cancelled"], true);
        assert!(v["avg_millis"].is_null());
        assert_eq!(v["target"]["port"], 80);
    }

    #[test]
    fn json_outcome_lines() {
        let r = ConsoleReporter { json: true };
        let o = AttemptOutcome {
            host: "::1".into(),
            port: 22,
            delivered: false,
            delay_millis: 0,
        };
        let v: serde_json::Value = serde_json::from_str(&r.render(&o).unwrap()).unwrap();
        assert_eq!(v["delivered"], false);
        assert_eq!(v["host"], "::1");

        let text = ConsoleReporter::default().render(&o).unwrap();
        assert_eq!(text, "Request for host [::1]:22 - Connection refused");
    }
}
