use tarn_heap::{Heap, ModuleReference};

#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Position(pub u32, pub u32);

pub const DUMMY_POSITION: Position = Position(u32::MAX, u32::MAX);

impl Position {
  pub fn is_dummy(self) -> bool {
    self == DUMMY_POSITION
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
  pub module_reference: ModuleReference,
  pub start: Position,
  pub end: Position,
}

impl Location {
  pub fn dummy() -> Self {
    Self { module_reference: ModuleReference::DUMMY, start: DUMMY_POSITION, end: DUMMY_POSITION }
  }

  pub fn from_pos(sl: u32, sc: u32, el: u32, ec: u32) -> Self {
    Self {
      module_reference: ModuleReference::DUMMY,
      start: Position(sl, sc),
      end: Position(el, ec),
    }
  }

  pub fn union(&self, other: &Self) -> Self {
    assert!(self.module_reference == other.module_reference);
    let start = if self.start < other.start { self.start } else { other.start };
    let end = if self.end > other.end { self.end } else { other.end };
    Self { module_reference: self.module_reference, start, end }
  }

  pub fn pretty_print_without_file(&self) -> String {
    if self.start.is_dummy() && self.end.is_dummy() {
      return "DUMMY".to_owned();
    }
    let (a, b, c, d) = (
      self.start.0 as u64 + 1,
      self.start.1 as u64 + 1,
      self.end.0 as u64 + 1,
      self.end.1 as u64 + 1,
    );
    format!("{}:{}-{}:{}", a, b, c, d)
  }

  pub fn pretty_print(&self, heap: &Heap) -> String {
    format!("{}:{}", self.module_reference.to_filename(heap), self.pretty_print_without_file())
  }
}
