use serde::{Deserialize, Serialize};

use super::error::{DecodeError, DecodeResult};
use super::timecode::PackedTimestamp;
use super::{BLOCK_SEPARATOR, COORD_SCALE, DEVICE_ID_PREFIX, FIX_RECORD_SIZE, MAX_BLOCKS, MIN_BLOCKS};

/// Device status byte exposed as an opaque bitset.
///
/// Bit meanings are firmware specific and undocumented; callers may test
/// individual bits but the decoder assigns them no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags(pub u8);

impl StatusFlags {
    /// Whether bit `n` (0..=7) is set.
    pub fn bit(self, n: u8) -> bool {
        debug_assert!(n < 8);
        (self.0 >> n) & 1 == 1
    }
}

/// One GPS fix decoded from a 13-byte location record.
///
/// Serializes with the short field names downstream consumers expect on the
/// location topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Epoch seconds (UTC).
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Degrees.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Degrees.
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Satellites used for the fix.
    #[serde(rename = "sat")]
    pub satellites: u8,
}

/// A fully decoded tracker payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerPacket {
    /// Device identity, tag prefix included.
    pub device_id: Box<str>,
    /// Battery voltage in volts.
    pub voltage: f64,
    /// Raw status byte.
    pub flags: StatusFlags,
    /// Fixes in wire order.
    pub fixes: Box<[GpsFix]>,
}

impl TrackerPacket {
    /// Decodes one raw request body.
    ///
    /// Pure function of the input bytes; the caller is expected to have
    /// bounded the buffer size before handing it over.
    pub fn from_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let blocks: Vec<&[u8]> = bytes
            .splitn(MAX_BLOCKS, |&b| b == BLOCK_SEPARATOR)
            .collect();

        if blocks.len() < MIN_BLOCKS {
            return Err(DecodeError::InvalidBlockCount {
                found: blocks.len(),
            });
        }

        // blocks[0] is the sender's key; not validated, not kept.

        let device_id = format!("{}{}", DEVICE_ID_PREFIX, String::from_utf8_lossy(blocks[1]));

        let voltage = parse_voltage(blocks[2])?;

        let flags = match blocks[3].first() {
            Some(&byte) => StatusFlags(byte),
            None => return Err(DecodeError::EmptyFlagsBlock),
        };

        // A payload with exactly four blocks carries no location data.
        let fix_block = blocks.get(4).copied().unwrap_or(&[]);
        let fixes = decode_fixes(fix_block)?;

        Ok(Self {
            device_id: device_id.into_boxed_str(),
            voltage,
            flags,
            fixes,
        })
    }
}

fn parse_voltage(block: &[u8]) -> DecodeResult<f64> {
    let invalid = || DecodeError::InvalidVoltage {
        text: String::from_utf8_lossy(block).into_owned(),
    };

    let text = std::str::from_utf8(block).map_err(|_| invalid())?;

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid()),
    }
}

/// Walks the location block in fixed strides. A trailing fragment shorter
/// than one record is transmission padding and is dropped without error.
fn decode_fixes(block: &[u8]) -> DecodeResult<Box<[GpsFix]>> {
    let mut fixes = Vec::with_capacity(block.len() / FIX_RECORD_SIZE);

    for record in block.chunks_exact(FIX_RECORD_SIZE) {
        let packed = PackedTimestamp(u32::from_le_bytes([
            record[0], record[1], record[2], record[3],
        ]));
        let satellites = record[4];
        let longitude_raw = u32::from_le_bytes([record[5], record[6], record[7], record[8]]);
        let latitude_raw = u32::from_le_bytes([record[9], record[10], record[11], record[12]]);

        fixes.push(GpsFix {
            timestamp: packed.to_epoch_seconds()?,
            latitude: f64::from(latitude_raw) / COORD_SCALE,
            longitude: f64::from(longitude_raw) / COORD_SCALE,
            satellites,
        });
    }

    Ok(fixes.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::super::timecode::TimeParts;
    use super::*;

    // 2023-05-10 14:30:00 UTC
    const PACKED_REFERENCE: u32 = 872_152_200;
    const EPOCH_REFERENCE: i64 = 1_683_729_000;

    fn fix_record(packed: u32, satellites: u8, latitude_raw: u32, longitude_raw: u32) -> [u8; 13] {
        let mut record = [0u8; 13];
        record[0..4].copy_from_slice(&packed.to_le_bytes());
        record[4] = satellites;
        record[5..9].copy_from_slice(&longitude_raw.to_le_bytes());
        record[9..13].copy_from_slice(&latitude_raw.to_le_bytes());
        record
    }

    fn payload(fix_block: &[u8]) -> Vec<u8> {
        let mut bytes = b"secret|dev01|23.45|\x05|".to_vec();
        bytes.extend_from_slice(fix_block);
        bytes
    }

    #[test]
    fn decodes_scalar_fields() {
        let packet = TrackerPacket::from_bytes(&payload(&[])).unwrap();

        assert_eq!(&*packet.device_id, "VDdev01");
        assert_eq!(packet.voltage, 23.45);
        assert_eq!(packet.flags, StatusFlags(0x05));
        assert!(packet.fixes.is_empty());
    }

    #[test]
    fn too_few_blocks_is_rejected() {
        let err = TrackerPacket::from_bytes(b"KEY|DEV").unwrap_err();
        assert_eq!(err, DecodeError::InvalidBlockCount { found: 2 });

        let err = TrackerPacket::from_bytes(b"").unwrap_err();
        assert_eq!(err, DecodeError::InvalidBlockCount { found: 1 });
    }

    #[test]
    fn four_blocks_without_location_block_is_valid() {
        let packet = TrackerPacket::from_bytes(b"key|dev|3.3|\x01").unwrap();
        assert!(packet.fixes.is_empty());
    }

    #[test]
    fn empty_flags_block_is_rejected() {
        let err = TrackerPacket::from_bytes(b"key|dev|3.3||").unwrap_err();
        assert_eq!(err, DecodeError::EmptyFlagsBlock);
    }

    #[test]
    fn single_byte_flags_block_is_enough() {
        let packet = TrackerPacket::from_bytes(b"key|dev|3.3|\xFF").unwrap();
        assert_eq!(packet.flags, StatusFlags(0xFF));
    }

    #[test]
    fn flags_block_beyond_first_byte_is_ignored() {
        let packet = TrackerPacket::from_bytes(b"key|dev|3.3|\x80junk").unwrap();
        assert_eq!(packet.flags, StatusFlags(0x80));
    }

    #[test]
    fn non_numeric_voltage_is_rejected() {
        let err = TrackerPacket::from_bytes(b"key|dev|abc|\x01|").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidVoltage {
                text: "abc".to_owned()
            }
        );
    }

    #[test]
    fn non_finite_voltage_is_rejected() {
        let err = TrackerPacket::from_bytes(b"key|dev|inf|\x01|").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidVoltage { .. }));
    }

    #[test]
    fn status_bits_are_independent() {
        let packet = TrackerPacket::from_bytes(b"key|dev|1.0|\xA5").unwrap();

        for n in 0..8u8 {
            assert_eq!(packet.flags.bit(n), (0xA5 >> n) & 1 == 1);
        }
    }

    #[test]
    fn decodes_fix_with_pinned_coordinate_order() {
        // latitude at offset 9, longitude at offset 5, matching the
        // hardware-captured reference traffic
        let record = fix_record(PACKED_REFERENCE, 7, 345_600_000, 123_400_000);
        let packet = TrackerPacket::from_bytes(&payload(&record)).unwrap();

        assert_eq!(packet.fixes.len(), 1);
        let fix = packet.fixes[0];
        assert_eq!(fix.timestamp, EPOCH_REFERENCE);
        assert_eq!(fix.latitude, 34.56);
        assert_eq!(fix.longitude, 12.34);
        assert_eq!(fix.satellites, 7);
    }

    #[test]
    fn trailing_fragment_is_discarded() {
        for extra in 1..FIX_RECORD_SIZE {
            let mut block = fix_record(PACKED_REFERENCE, 4, 10, 20).to_vec();
            block.extend_from_slice(&vec![0xAA; extra]);

            let packet = TrackerPacket::from_bytes(&payload(&block)).unwrap();
            assert_eq!(packet.fixes.len(), 1);
        }
    }

    #[test]
    fn short_location_block_yields_no_fixes() {
        let packet = TrackerPacket::from_bytes(&payload(&[0x42])).unwrap();
        assert!(packet.fixes.is_empty());
    }

    #[test]
    fn separator_bytes_inside_location_block_do_not_split() {
        // 0x7C is '|'; the fifth block absorbs it verbatim
        let record = fix_record(PACKED_REFERENCE, b'|', 0x7C7C, 0x7C);
        let packet = TrackerPacket::from_bytes(&payload(&record)).unwrap();

        assert_eq!(packet.fixes.len(), 1);
        assert_eq!(packet.fixes[0].satellites, b'|');
    }

    #[test]
    fn reference_block_of_69_records_decodes_fully() {
        let mut block = Vec::new();
        for i in 0..69u8 {
            let packed = PackedTimestamp::from_parts(TimeParts {
                year: 2023,
                month: 5,
                day: 10,
                hour: 14,
                minute: 30 + i / 60,
                second: i % 60,
            });
            block.extend_from_slice(&fix_record(packed.0, i, 345_600_000, 123_400_000));
        }

        let packet = TrackerPacket::from_bytes(&payload(&block)).unwrap();

        assert_eq!(packet.fixes.len(), 69);
        // insertion order is byte order
        for (i, fix) in packet.fixes.iter().enumerate() {
            assert_eq!(fix.satellites, i as u8);
            assert_eq!(fix.timestamp, EPOCH_REFERENCE + i as i64);
        }
    }

    #[test]
    fn out_of_range_timestamp_fails_the_whole_packet() {
        let bad = PackedTimestamp::from_parts(TimeParts {
            year: 2023,
            month: 0,
            day: 10,
            hour: 14,
            minute: 30,
            second: 0,
        });
        let mut block = fix_record(PACKED_REFERENCE, 1, 10, 20).to_vec();
        block.extend_from_slice(&fix_record(bad.0, 2, 10, 20));

        let err = TrackerPacket::from_bytes(&payload(&block)).unwrap_err();
        assert_eq!(err, DecodeError::TimestampOutOfRange { packed: bad.0 });
    }

    #[test]
    fn parallel_decodes_agree() {
        let record = fix_record(PACKED_REFERENCE, 9, 345_600_000, 123_400_000);
        let bytes = payload(&record);
        let expected = TrackerPacket::from_bytes(&bytes).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| TrackerPacket::from_bytes(&bytes).unwrap()))
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn fix_serializes_with_wire_field_names() {
        let fix = GpsFix {
            timestamp: 0,
            latitude: 34.56,
            longitude: 12.34,
            satellites: 3,
        };

        let json = serde_json::to_string(&fix).unwrap();
        assert_eq!(json, r#"{"ts":0,"lat":34.56,"lng":12.34,"sat":3}"#);
    }
}
