//! An ordered, tag-unique collection of data elements.

use crate::dictionary::TagDictionary;
use crate::element::{read_element, write_element, DataElement, Reader, Result, VrMode};
use crate::tag::Tag;

/// An ordered mapping from [`Tag`] to [`DataElement`].
///
/// Encounter order is preserved for faithful re-serialization; lookup is by
/// tag. Tags are unique within one dataset scope: putting an element whose
/// tag is already present overwrites the earlier entry in place
/// (last-write-wins), matching permissive real-world producers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    elements: Vec<DataElement>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.position(tag).is_some()
    }

    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.position(tag).map(|idx| &self.elements[idx])
    }

    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut DataElement> {
        self.position(tag).map(|idx| &mut self.elements[idx])
    }

    /// Insert an element, overwriting any earlier entry with the same tag
    /// while keeping its original position.
    pub fn put(&mut self, elem: DataElement) {
        match self.position(elem.tag()) {
            Some(idx) => self.elements[idx] = elem,
            None => self.elements.push(elem),
        }
    }

    /// Remove the element with the given tag, preserving the order of the
    /// remainder. Returns the removed element, if any.
    pub fn remove(&mut self, tag: Tag) -> Option<DataElement> {
        self.position(tag).map(|idx| self.elements.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataElement> {
        self.elements.iter()
    }

    fn position(&self, tag: Tag) -> Option<usize> {
        self.elements.iter().position(|e| e.tag() == tag)
    }

    /// Parse a dataset from raw element bytes until the stream is exhausted.
    pub(crate) fn read(reader: &mut Reader<'_>, mode: VrMode, dict: &TagDictionary) -> Result<Self> {
        let mut dataset = Dataset::new();
        while !reader.is_empty() {
            dataset.put(read_element(reader, mode, dict)?);
        }
        Ok(dataset)
    }

    /// Serialize all elements in stored order.
    pub(crate) fn to_bytes(&self, mode: VrMode) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for elem in &self.elements {
            write_element(&mut buf, elem, mode)?;
        }
        Ok(buf)
    }
}

impl IntoIterator for Dataset {
    type Item = DataElement;
    type IntoIter = std::vec::IntoIter<DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;
    use crate::vr::VR;

    #[test]
    fn test_put_preserves_order() {
        let mut ds = Dataset::new();
        ds.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
        ds.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));
        ds.put(DataElement::text(tags::MODALITY, VR::CS, "CT"));

        let order: Vec<Tag> = ds.iter().map(|e| e.tag()).collect();
        assert_eq!(
            order,
            vec![tags::PATIENT_NAME, tags::PATIENT_ID, tags::MODALITY]
        );
    }

    #[test]
    fn test_put_last_write_wins_in_place() {
        let mut ds = Dataset::new();
        ds.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
        ds.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));
        ds.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "Jane^Doe"));

        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.get(tags::PATIENT_NAME).unwrap().string_value().unwrap(),
            "Jane^Doe"
        );
        // overwritten entry keeps its original position
        assert_eq!(ds.iter().next().unwrap().tag(), tags::PATIENT_NAME);
    }

    #[test]
    fn test_remove() {
        let mut ds = Dataset::new();
        ds.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
        ds.put(DataElement::text(tags::PATIENT_ID, VR::LO, "12345"));

        let removed = ds.remove(tags::PATIENT_NAME).unwrap();
        assert_eq!(removed.tag(), tags::PATIENT_NAME);
        assert_eq!(ds.len(), 1);
        assert!(ds.remove(tags::PATIENT_NAME).is_none());
    }

    #[test]
    fn test_round_trip_both_modes() {
        let dict = TagDictionary::new();
        let mut ds = Dataset::new();
        ds.put(DataElement::text(tags::MODALITY, VR::CS, "MR"));
        ds.put(DataElement::text(tags::PATIENT_NAME, VR::PN, "John^Doe"));
        ds.put(DataElement::new(
            tags::ROWS,
            VR::US,
            512u16.to_le_bytes().to_vec(),
        ));

        for mode in [VrMode::Explicit, VrMode::Implicit] {
            let bytes = ds.to_bytes(mode).unwrap();
            let mut reader = Reader::new(&bytes);
            let reparsed = Dataset::read(&mut reader, mode, &dict).unwrap();
            assert_eq!(reparsed, ds);
        }
    }
}
