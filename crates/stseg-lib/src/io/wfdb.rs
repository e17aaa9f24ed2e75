//! WFDB record and MIT annotation loading.
//!
//! Records come in through `wfdb-rust`; the binary MIT annotation stream
//! (.atr) is parsed here, keeping both the sample offset and the annotation
//! code so segmentation can attach label symbols.

use crate::signal::{Events, TimeSeries};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// One entry of a MIT annotation stream.
#[derive(Debug, Clone, Copy)]
pub struct Annotation {
    pub sample: usize,
    pub code: u8,
}

impl Annotation {
    /// Beat annotations occupy codes 1..=49; everything above is rhythm,
    /// signal-quality, or bookkeeping.
    pub fn is_beat(&self) -> bool {
        self.code > 0 && self.code < 50
    }

    /// PhysioBank display symbol for the annotation code.
    pub fn symbol(&self) -> char {
        match self.code {
            1 => 'N',
            2 => 'L',
            3 => 'R',
            4 => 'a',
            5 => 'V',
            6 => 'F',
            7 => 'J',
            8 => 'A',
            9 => 'S',
            10 => 'E',
            11 => 'j',
            12 => '/',
            13 => 'Q',
            14 => '~',
            16 => '|',
            25 => 'B',
            34 => 'e',
            35 => 'n',
            38 => 'f',
            41 => 'r',
            _ => '?',
        }
    }
}

/// Load one lead of a WFDB header/data pair, applying gain and baseline.
pub fn load_lead(header_path: &Path, lead: usize) -> Result<TimeSeries> {
    let (header, signals) = wfdb_rust::parse_wfdb(header_path);
    if lead >= signals.len() {
        anyhow::bail!(
            "record has {} signals, lead {} requested",
            signals.len(),
            lead
        );
    }
    let spec = &header.signal_specs[lead];
    let raw = &signals[lead];
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .unwrap_or(250.0);
    let data = raw
        .iter()
        .map(|&sample| (sample as f64 - baseline) / gain)
        .collect();
    Ok(TimeSeries { fs, data })
}

/// Decode a MIT annotation byte stream into (sample, code) entries.
///
/// Each 16-bit little-endian word carries a 6-bit code and a 10-bit sample
/// increment. SKIP (59) consumes a 4-byte absolute jump, AUX (63) consumes
/// a padded payload, and NUM/SUB/CHN (60..=62) modify bookkeeping fields we
/// do not track.
pub fn parse_annotations(buf: &[u8]) -> Vec<Annotation> {
    let mut out = Vec::new();
    let mut idx = 0;
    let mut sample: usize = 0;
    while idx + 2 <= buf.len() {
        let word = u16::from_le_bytes([buf[idx], buf[idx + 1]]);
        idx += 2;
        let code = (word >> 10) as u8;
        let diff = (word & 0x03FF) as usize;
        if code == 0 && diff == 0 {
            break;
        }
        match code {
            59 => {
                if idx + 4 > buf.len() {
                    break;
                }
                let high = u16::from_le_bytes([buf[idx], buf[idx + 1]]) as u32;
                let low = u16::from_le_bytes([buf[idx + 2], buf[idx + 3]]) as u32;
                idx += 4;
                let skip = (high << 16) | low;
                sample = sample.wrapping_add(skip as usize);
            }
            60..=62 => {
                // NUM/SUB/CHN payload rides in `diff`; no time advance.
            }
            63 => {
                idx += diff;
                if diff % 2 != 0 && idx < buf.len() {
                    idx += 1;
                }
            }
            _ => {
                sample = sample.wrapping_add(diff);
                out.push(Annotation { sample, code });
            }
        }
    }
    out
}

/// Read an annotation file and keep the beat entries as events plus their
/// label symbols, positionally aligned.
pub fn load_beat_annotations(path: &Path) -> Result<(Events, Vec<char>)> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let beats: Vec<Annotation> = parse_annotations(&buf)
        .into_iter()
        .filter(Annotation::is_beat)
        .collect();
    let indices = beats.iter().map(|a| a.sample).collect();
    let symbols = beats.iter().map(Annotation::symbol).collect();
    Ok((Events::from_indices(indices), symbols))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(code: u16, diff: u16) -> [u8; 2] {
        ((code << 10) | diff).to_le_bytes()
    }

    #[test]
    fn parses_incremental_samples_and_codes() {
        let mut bytes = Vec::new();
        bytes.extend(word(1, 5)); // N at 5
        bytes.extend(word(5, 10)); // V at 15
        bytes.extend(word(0, 0)); // terminator
        let anns = parse_annotations(&bytes);
        assert_eq!(anns.len(), 2);
        assert_eq!((anns[0].sample, anns[0].symbol()), (5, 'N'));
        assert_eq!((anns[1].sample, anns[1].symbol()), (15, 'V'));
    }

    #[test]
    fn skip_advances_absolute_offset() {
        let mut bytes = Vec::new();
        bytes.extend(word(1, 5));
        bytes.extend(word(59, 0));
        bytes.extend(0x0000u16.to_le_bytes());
        bytes.extend(0x1388u16.to_le_bytes()); // +5000
        bytes.extend(word(1, 3));
        bytes.extend(word(0, 0));
        let anns = parse_annotations(&bytes);
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[1].sample, 5008);
    }

    #[test]
    fn aux_payload_is_skipped_with_padding() {
        let mut bytes = Vec::new();
        bytes.extend(word(1, 5));
        bytes.extend(word(63, 3)); // 3 payload bytes, padded to 4
        bytes.extend([b'x', b'y', b'z', 0]);
        bytes.extend(word(1, 7));
        bytes.extend(word(0, 0));
        let anns = parse_annotations(&bytes);
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[1].sample, 12);
    }

    #[test]
    fn non_beat_codes_are_filtered() {
        let anns = [
            Annotation { sample: 1, code: 1 },
            Annotation {
                sample: 2,
                code: 50,
            },
        ];
        assert!(anns[0].is_beat());
        assert!(!anns[1].is_beat());
    }
}
