use itertools::Itertools;
use std::{collections::HashMap, rc::Rc};

/// An interned string id, free to be copied. Strings are never deallocated
/// within a compilation, so ids stay valid for the lifetime of the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PStr(u32);

impl PStr {
  /// The discard identifier `_`.
  pub const UNDERSCORE: PStr = PStr(0);
  /// The function arrow token `->`.
  pub const ARROW: PStr = PStr(1);
  pub const DUMMY_MODULE: PStr = PStr(2);

  pub fn as_str<'a>(&self, heap: &'a Heap) -> &'a str {
    &heap.str_storage[self.0 as usize]
  }
}

/// An interned module path. The empty path is the root module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleReference(u32);

impl ModuleReference {
  pub const ROOT: ModuleReference = ModuleReference(0);
  pub const DUMMY: ModuleReference = ModuleReference(1);

  pub fn get_parts<'a>(&self, heap: &'a Heap) -> &'a [PStr] {
    &heap.module_storage[self.0 as usize]
  }

  pub fn pretty_print(&self, heap: &Heap) -> String {
    self.get_parts(heap).iter().map(|p| p.as_str(heap)).join(".")
  }

  pub fn to_filename(&self, heap: &Heap) -> String {
    self.get_parts(heap).iter().map(|p| p.as_str(heap)).join("/") + ".tarn"
  }
}

/// Owner of all interned strings and module paths. Exclusively owned by one
/// compilation; allocation only, no deallocation.
pub struct Heap {
  str_storage: Vec<Rc<str>>,
  interned_strings: HashMap<Rc<str>, u32>,
  module_storage: Vec<Rc<[PStr]>>,
  interned_modules: HashMap<Rc<[PStr]>, u32>,
}

impl Heap {
  pub fn new() -> Heap {
    let mut heap = Heap {
      str_storage: Vec::new(),
      interned_strings: HashMap::new(),
      module_storage: Vec::new(),
      interned_modules: HashMap::new(),
    };
    let underscore = heap.alloc_str("_");
    let arrow = heap.alloc_str("->");
    let dummy = heap.alloc_str("DUMMY");
    debug_assert!(underscore == PStr::UNDERSCORE);
    debug_assert!(arrow == PStr::ARROW);
    debug_assert!(dummy == PStr::DUMMY_MODULE);
    let root = heap.alloc_module_reference(Vec::new());
    let dummy_mod = heap.alloc_module_reference(vec![PStr::DUMMY_MODULE]);
    debug_assert!(root == ModuleReference::ROOT);
    debug_assert!(dummy_mod == ModuleReference::DUMMY);
    heap
  }

  pub fn alloc_str(&mut self, s: &str) -> PStr {
    if let Some(id) = self.interned_strings.get(s) {
      PStr(*id)
    } else {
      let id = self.str_storage.len() as u32;
      let stored: Rc<str> = Rc::from(s);
      self.str_storage.push(stored.clone());
      self.interned_strings.insert(stored, id);
      PStr(id)
    }
  }

  pub fn alloc_string(&mut self, s: String) -> PStr {
    self.alloc_str(&s)
  }

  pub fn alloc_module_reference(&mut self, parts: Vec<PStr>) -> ModuleReference {
    if let Some(id) = self.interned_modules.get(parts.as_slice()) {
      ModuleReference(*id)
    } else {
      let id = self.module_storage.len() as u32;
      let stored: Rc<[PStr]> = Rc::from(parts);
      self.module_storage.push(stored.clone());
      self.interned_modules.insert(stored, id);
      ModuleReference(id)
    }
  }

  /// The module path of `parent` extended with one more component.
  pub fn alloc_child_module_reference(
    &mut self,
    parent: ModuleReference,
    child: PStr,
  ) -> ModuleReference {
    let mut parts = parent.get_parts(self).to_vec();
    parts.push(child);
    self.alloc_module_reference(parts)
  }
}

impl Default for Heap {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn well_known_strings_test() {
    let heap = Heap::new();
    assert_eq!("_", PStr::UNDERSCORE.as_str(&heap));
    assert_eq!("->", PStr::ARROW.as_str(&heap));
    assert_eq!("DUMMY", ModuleReference::DUMMY.pretty_print(&heap));
  }

  #[test]
  fn interning_test() {
    let mut heap = Heap::new();
    let a1 = heap.alloc_str("foo");
    let a2 = heap.alloc_string("foo".to_string());
    let b = heap.alloc_str("bar");
    assert_eq!(a1, a2);
    assert!(a1 != b);
    assert_eq!("foo", a1.as_str(&heap));
    assert_eq!("bar", b.as_str(&heap));
  }

  #[test]
  fn module_reference_test() {
    let mut heap = Heap::new();
    let std_p = heap.alloc_str("std");
    let list_p = heap.alloc_str("list");
    let std_mod = heap.alloc_module_reference(vec![std_p]);
    let std_list = heap.alloc_child_module_reference(std_mod, list_p);
    assert_eq!(std_list, heap.alloc_module_reference(vec![std_p, list_p]));
    assert_eq!("std.list", std_list.pretty_print(&heap));
    assert_eq!("std/list.tarn", std_list.to_filename(&heap));
    assert_eq!("", ModuleReference::ROOT.pretty_print(&heap));
    assert_eq!([std_p, list_p].as_slice(), std_list.get_parts(&heap));
  }

  #[test]
  fn boilerplate() {
    assert!(!format!("{:?} {:?}", PStr::UNDERSCORE, ModuleReference::ROOT).is_empty());
    assert!(PStr::UNDERSCORE < PStr::ARROW);
    assert!(ModuleReference::ROOT < ModuleReference::DUMMY);
    Heap::default();
  }
}
