//! Console report for a finished run.

use std::io::{self, Write};
use std::time::Duration;

use gendrive_abi::Device;
use serde::Serialize;

use crate::config::OutputFormat;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub model: String,
    pub device: Device,
    /// Formatted prompt, exactly as it was encoded.
    pub prompt: String,
    /// Decoded output of the timed run.
    pub output: String,
    /// Timed generation plus the device barrier; warm-up excluded.
    pub elapsed: Duration,
    pub prompt_tokens: usize,
    pub output_tokens: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    model: &'a str,
    device: Device,
    inference_time_s: f64,
    prompt: &'a str,
    output: &'a str,
    prompt_tokens: usize,
    output_tokens: usize,
}

fn section(label: &str) -> String {
    let bar = "-".repeat(20);
    format!("{bar} {label} {bar}")
}

impl Report {
    #[inline]
    pub fn inference_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn write<W: Write>(&self, format: OutputFormat, out: &mut W) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out),
            OutputFormat::Json => self.write_json(out),
        }
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Inference time: {} s", self.inference_secs())?;
        writeln!(out, "{}", section("Prompt"))?;
        writeln!(out, "{}", self.prompt)?;
        writeln!(out, "{}", section("Output"))?;
        writeln!(out, "{}", self.output)?;
        out.flush()
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let view = JsonReport {
            model: &self.model,
            device: self.device,
            inference_time_s: self.inference_secs(),
            prompt: &self.prompt,
            output: &self.output,
            prompt_tokens: self.prompt_tokens,
            output_tokens: self.output_tokens,
        };
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            model: "mlabonne/phixtral-4x2_8".into(),
            device: Device::xpu(),
            prompt: " Question:What is AI?\n\n Answer:".into(),
            output: "hello".into(),
            elapsed: Duration::from_millis(1500),
            prompt_tokens: 9,
            output_tokens: 3,
        }
    }

    #[test]
    fn text_layout() {
        let mut buf = Vec::new();
        sample().write_text(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Inference time: 1.5 s\n\
             -------------------- Prompt --------------------\n \
             Question:What is AI?\n\n Answer:\n\
             -------------------- Output --------------------\n\
             hello\n"
        );
    }

    #[test]
    fn json_carries_the_same_data() {
        let mut buf = Vec::new();
        sample().write(OutputFormat::Json, &mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["device"], "xpu:0");
        assert_eq!(v["inference_time_s"], 1.5);
        assert_eq!(v["output"], "hello");
        assert_eq!(v["output_tokens"], 3);
    }
}
