//! `Tune` event stream to Standard MIDI File conversion (§3, §6).
//!
//! Each partition (an independent voice created by a controller or
//! metadata message) keeps its own running tick cursor; pause and note
//! events advance only the cursor of the partition they belong to.
//! Partitions are assigned MIDI channels 0-15 the first time a controller
//! or metadata message names them, in encounter order. Once every channel
//! is in use, a further unseen partition id fails the conversion — this
//! library does not attempt channel reuse or multiplexing.

use std::collections::HashMap;

use rsrc_errors::Error;

const TICKS_PER_QUARTER: u16 = 600;

#[derive(Debug, Clone, Copy)]
struct MidiEvent {
    tick: u32,
    order: usize,
    kind: MidiEventKind,
}

#[derive(Debug, Clone, Copy)]
enum MidiEventKind {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8 },
}

struct Partition {
    channel: u8,
    tick: u32,
}

struct Channels {
    by_partition: HashMap<u32, Partition>,
    next_channel: u8,
}

impl Channels {
    fn new() -> Self {
        Self { by_partition: HashMap::new(), next_channel: 0 }
    }

    fn assign(&mut self, partition_id: u32) -> Result<u8, Error> {
        if let Some(partition) = self.by_partition.get(&partition_id) {
            return Ok(partition.channel);
        }

        if self.next_channel >= 16 {
            return Err(Error::MalformedContainer("Tune stream uses more than 16 concurrent partitions".into()));
        }

        let channel = self.next_channel;
        self.next_channel += 1;
        self.by_partition.insert(partition_id, Partition { channel, tick: 0 });

        Ok(channel)
    }

    fn partition_mut(&mut self, partition_id: u32) -> Result<&mut Partition, Error> {
        self.assign(partition_id)?;
        Ok(self.by_partition.get_mut(&partition_id).expect("just assigned"))
    }
}

fn read_event(bytes: &[u8], offset: usize) -> Result<u32, Error> {
    let word = bytes.get(offset..offset + 4).ok_or(Error::OutOfRange(offset, 4, bytes.len()))?;
    Ok(u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
}

/// Parse a `Tune` resource's event stream and render it as a Standard MIDI
/// File, type 0, single track, 600 ticks per quarter note.
pub fn to_midi(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let mut channels = Channels::new();
    let mut events = Vec::new();
    let mut order = 0usize;
    let mut offset = 0usize;

    while offset < bytes.len() {
        let event = read_event(bytes, offset)?;
        offset += 4;

        let kind_nibble = (event >> 28) & 0xF;

        match kind_nibble {
            0 | 1 => {
                // Simple events pack a 5-bit partition id into the byte the
                // type nibble's low bit also lives in.
                let partition_id = (event >> 24) & 0x1F;
                let duration = event & 0x00FF_FFFF;
                let partition = channels.partition_mut(partition_id)?;
                partition.tick += duration;
            }
            2 | 3 => {
                let partition_id = (event >> 24) & 0x1F;
                let key = ((event >> 18) & 0x3F) as u8 + 32;
                let velocity = ((event >> 11) & 0x7F) as u8;
                let duration = event & 0x07FF;

                let partition = channels.partition_mut(partition_id)?;
                let channel = partition.channel;
                let start = partition.tick;
                partition.tick += duration;

                events.push(MidiEvent { tick: start, order, kind: MidiEventKind::NoteOn { channel, key, velocity } });
                order += 1;
                events.push(MidiEvent { tick: start + duration, order, kind: MidiEventKind::NoteOff { channel, key } });
                order += 1;
            }
            4 | 5 => {
                let partition_id = (event >> 24) & 0x1F;
                channels.assign(partition_id)?;
            }
            9 => {
                // Extended events widen the partition id to 12 bits and move
                // it (and the key) up into the first word; velocity and
                // duration live in a second word that follows.
                let partition_id = (event >> 16) & 0xFFF;
                let key = ((event >> 8) & 0xFF) as u8;
                let options = read_event(bytes, offset)?;
                offset += 4;
                let velocity = ((options >> 22) & 0x7F) as u8;
                let duration = options & 0x003F_FFFF;

                let partition = channels.partition_mut(partition_id)?;
                let channel = partition.channel;
                let start = partition.tick;
                partition.tick += duration;

                events.push(MidiEvent { tick: start, order, kind: MidiEventKind::NoteOn { channel, key, velocity } });
                order += 1;
                events.push(MidiEvent { tick: start + duration, order, kind: MidiEventKind::NoteOff { channel, key } });
                order += 1;
            }
            0xA => {
                let partition_id = (event >> 16) & 0xFFF;
                channels.assign(partition_id)?;
                offset += 4; // options word, not otherwise interpreted
            }
            0xF => {
                // Metadata messages can also introduce a partition (an
                // instrument-definition message is often the first mention
                // of a voice that never emits a controller event).
                let partition_id = (event >> 16) & 0xFFF;
                channels.assign(partition_id)?;

                let message_words = (event & 0xFFFF) as usize;
                if message_words < 2 {
                    return Err(Error::MalformedContainer("Tune metadata message too short for its type field".into()));
                }
                offset += (message_words - 1) * 4;
            }
            _ => {
                // Reserved event kind: skip, assuming no trailing word.
            }
        }
    }

    events.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.order.cmp(&b.order)));

    Ok(serialize_smf(&events))
}

fn write_vlq(out: &mut Vec<u8>, mut value: u32) {
    let mut stack = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        stack.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    stack.reverse();
    out.extend_from_slice(&stack);
}

fn serialize_smf(events: &[MidiEvent]) -> Vec<u8> {
    let mut track = Vec::new();
    let mut last_tick = 0u32;

    for event in events {
        write_vlq(&mut track, event.tick - last_tick);
        last_tick = event.tick;

        match event.kind {
            MidiEventKind::NoteOn { channel, key, velocity } => {
                track.push(0x90 | (channel & 0x0F));
                track.push(key & 0x7F);
                track.push(velocity & 0x7F);
            }
            MidiEventKind::NoteOff { channel, key } => {
                track.push(0x80 | (channel & 0x0F));
                track.push(key & 0x7F);
                track.push(0);
            }
        }
    }

    write_vlq(&mut track, 0);
    track.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // format 0
    out.extend_from_slice(&1u16.to_be_bytes()); // one track
    out.extend_from_slice(&TICKS_PER_QUARTER.to_be_bytes());

    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(track.len() as u32).to_be_bytes());
    out.extend_from_slice(&track);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_note(partition: u32, key_offset: u32, velocity: u32, duration: u32) -> u32 {
        (2 << 28) | (partition << 24) | (key_offset << 18) | (velocity << 11) | (duration & 0x7FF)
    }

    fn controller(partition: u32) -> u32 {
        (4 << 28) | (partition << 24)
    }

    fn pause(partition: u32, duration: u32) -> u32 {
        (0 << 28) | (partition << 24) | (duration & 0x00FF_FFFF)
    }

    fn push_be(bytes: &mut Vec<u8>, word: u32) {
        bytes.extend_from_slice(&word.to_be_bytes());
    }

    #[test]
    fn test_single_partition_note_becomes_on_off_pair() {
        let mut stream = Vec::new();
        push_be(&mut stream, controller(0));
        push_be(&mut stream, short_note(0, 8, 100, 50));

        let midi = to_midi(&stream).unwrap();

        assert_eq!(&midi[0..4], b"MThd");
        assert_eq!(&midi[14..18], b"MTrk");

        let track = &midi[22..];
        // delta 0, note-on status 0x90, key 40, velocity 100
        assert_eq!(track[0], 0);
        assert_eq!(track[1], 0x90);
        assert_eq!(track[2], 40);
        assert_eq!(track[3], 100);
    }

    #[test]
    fn test_pause_advances_tick() {
        let mut stream = Vec::new();
        push_be(&mut stream, controller(0));
        push_be(&mut stream, pause(0, 10));
        push_be(&mut stream, short_note(0, 0, 64, 5));

        let midi = to_midi(&stream).unwrap();
        // note-on should carry a nonzero delta-time of 10 (VLQ single byte 0x0A)
        let track = &midi[22..];
        assert_eq!(track[0], 10);
    }

    #[test]
    fn test_all_sixteen_partitions_assign_distinct_channels() {
        let mut stream = Vec::new();
        for partition in 0..16u32 {
            push_be(&mut stream, controller(partition));
        }

        assert!(to_midi(&stream).is_ok());
    }

    fn extended_note(partition: u32, key: u32) -> (u32, u32) {
        let event = (9 << 28) | (partition << 16) | (key << 8);
        let velocity = 100u32;
        let duration = 75u32;
        let options = (velocity << 22) | duration;
        (event, options)
    }

    #[test]
    fn test_extended_note_widens_partition_and_key() {
        let mut stream = Vec::new();
        push_be(&mut stream, controller(0));
        let (event, options) = extended_note(0, 60);
        push_be(&mut stream, event);
        push_be(&mut stream, options);

        let midi = to_midi(&stream).unwrap();
        let track = &midi[22..];
        assert_eq!(track[0], 0);
        assert_eq!(track[1], 0x90);
        assert_eq!(track[2], 60);
        assert_eq!(track[3], 100);
    }

    #[test]
    fn test_metadata_message_assigns_partition_and_skips_payload() {
        let mut stream = Vec::new();
        // metadata event: partition 3, 4 words total (this word plus 3 more)
        push_be(&mut stream, (0xF << 28) | (3 << 16) | 4);
        push_be(&mut stream, 0);
        push_be(&mut stream, 0);
        push_be(&mut stream, 10); // second-to-last word carries the message type, unused here
        // a note on the same partition should reuse the channel metadata assigned
        push_be(&mut stream, short_note(3, 8, 100, 50));

        let midi = to_midi(&stream).unwrap();
        let track = &midi[22..];
        assert_eq!(track[1], 0x90);
    }
}
