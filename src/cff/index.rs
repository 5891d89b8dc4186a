use crate::read::Reader;
use crate::write::Writer;
use std::fmt::{self, Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// A CFF2 INDEX: a count, an offset array and the packed object data.
///
/// The offset size is not stored; it is rechosen minimally on every write.
#[derive(Clone, Default)]
pub struct Index(pub Vec<Vec<u8>>);

impl Index {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_one(item: Vec<u8>) -> Self {
        Self(vec![item])
    }

    /// The encoded byte length of this INDEX.
    pub fn size(&self) -> usize {
        if self.0.is_empty() {
            return 4;
        }

        let data_len: usize = self.0.iter().map(|v| v.len()).sum();
        let offsize = Offsize::select((data_len + 1) as u32) as usize;
        4 + 1 + offsize * (self.0.len() + 1) + data_len
    }

    pub fn write(&self, w: &mut Writer) {
        w.write::<u32>(self.0.len() as u32);
        if self.0.is_empty() {
            return;
        }

        let data_len: usize = self.0.iter().map(|v| v.len()).sum();
        let end = (data_len + 1) as u32;
        let offsize = Offsize::select(end);
        w.write::<u8>(offsize as u8);

        let offsize = offsize as usize;
        let mut offset = 1u32;
        let mut give_offset = |w: &mut Writer, offset: u32| {
            let bytes = offset.to_be_bytes();
            w.extend(&bytes[4 - offsize..]);
        };

        give_offset(w, offset);
        for object in &self.0 {
            offset += object.len() as u32;
            give_offset(w, offset);
        }

        for object in &self.0 {
            w.extend(object);
        }
    }

    pub fn parse(r: &mut Reader<'_>) -> Option<Self> {
        let count = r.read::<u32>()? as usize;
        if count == 0 {
            return Some(Self(vec![]));
        }

        let offsize = r.read::<u8>()? as usize;
        if !(1..=4).contains(&offsize) {
            return None;
        }

        let mut read_offset = |r: &mut Reader| {
            let mut bytes = [0u8; 4];
            bytes[4 - offsize..].copy_from_slice(r.read_bytes(offsize)?);
            Some(u32::from_be_bytes(bytes) as usize)
        };

        let mut last = read_offset(r)?;
        if last == 0 {
            return None;
        }
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let next = read_offset(r)?;
            if next < last {
                return None;
            }
            offsets.push((last, next));
            last = next;
        }

        let data = r.read_bytes(last - 1)?;
        let mut objects = Vec::with_capacity(count);
        for (start, end) in offsets {
            objects.push(data.get(start - 1..end - 1)?.to_vec());
        }

        Some(Self(objects))
    }
}

impl Debug for Index {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(&self.0).finish()
    }
}

impl Deref for Index {
    type Target = [Vec<u8>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Index {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The number of bytes an INDEX offset is encoded with.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
enum Offsize {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Offsize {
    fn select(max: u32) -> Self {
        if max < (1 << 8) {
            Self::One
        } else if max < (1 << 16) {
            Self::Two
        } else if max < (1 << 24) {
            Self::Three
        } else {
            Self::Four
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(index: Index) {
        let mut w = Writer::new();
        index.write(&mut w);
        let bytes = w.finish();
        assert_eq!(bytes.len(), index.size());

        let mut r = Reader::new(&bytes);
        let reparsed = Index::parse(&mut r).unwrap();
        assert_eq!(index.0, reparsed.0);
        assert!(r.at_end());
    }

    #[test]
    fn empty_index_is_count_only() {
        let index = Index::new();
        assert_eq!(index.size(), 4);
        let mut w = Writer::new();
        index.write(&mut w);
        assert_eq!(w.finish(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn roundtrips() {
        roundtrip(Index::from_one(vec![1, 2, 3]));
        roundtrip(Index(vec![vec![], vec![7; 10], vec![9]]));
        // Offsets past one byte.
        roundtrip(Index(vec![vec![0; 200], vec![1; 200]]));
        // Offsets past two bytes.
        roundtrip(Index(vec![vec![0; 70_000], vec![1; 5]]));
    }

    #[test]
    fn offsize_selection() {
        assert_eq!(Offsize::select(255), Offsize::One);
        assert_eq!(Offsize::select(256), Offsize::Two);
        assert_eq!(Offsize::select(65_536), Offsize::Three);
        assert_eq!(Offsize::select(1 << 24), Offsize::Four);
    }
}
