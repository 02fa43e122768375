//! The accounted heap that owns every composite Value.
//!
//! Four arenas (strings, objects, arrays, functions), a running `allocated`
//! byte estimate, and a `heap_size` ceiling taken from Module metadata.
//! Allocation past the ceiling triggers one reclamation pass for
//! unreachable interned strings before failing.
//!
//! Callers pass GC roots as a plain slice rather than a closure: the
//! execution engine computes its root set (stack + frame locals + globals)
//! eagerly before calling into the Pool, which keeps this type free of any
//! borrow back onto the engine that owns it.

use hashbrown::HashMap;

use crate::error::{DialError, DialResult};
use crate::value::{Array, ArrayHandle, FunctionHandle, FunctionRef, Object, ObjectHandle, StringHandle, Value};

/// Per-kind size estimates used to charge the heap ceiling. Tunable, but
/// must be applied deterministically so the same module allocates the
/// same way on every host.
const OBJECT_SIZE: usize = 100;
const FUNCTION_SIZE: usize = 32;
const ARRAY_BASE_SIZE: usize = 50;
const ARRAY_PER_ITEM: usize = 24;
const STRING_BASE_SIZE: usize = 50;
const STRING_PER_BYTE: usize = 2;

fn string_size_estimate(len: usize) -> usize {
    STRING_BASE_SIZE + STRING_PER_BYTE * len
}

fn array_size_estimate(size: usize) -> usize {
    ARRAY_BASE_SIZE + ARRAY_PER_ITEM * size
}

/// A single string arena slot. `Free` marks a reclaimed slot whose index
/// may be reused.
enum StringSlot {
    Live(String),
    Free,
}

/// The accounted heap owning all composite Values for one VM instance.
pub struct Pool {
    heap_size: usize,
    allocated: usize,

    strings: Vec<StringSlot>,
    string_free_list: Vec<u32>,
    /// Content -> handle, for mandatory interning of constants and
    /// recommended interning of concatenation/template results.
    string_intern: HashMap<String, StringHandle>,

    objects: Vec<Option<Object>>,
    object_free_list: Vec<u32>,

    arrays: Vec<Option<Array>>,
    array_free_list: Vec<u32>,

    functions: Vec<Option<FunctionRef>>,
    function_free_list: Vec<u32>,
}

impl Pool {
    /// Creates a new Pool with the given `heap_size` ceiling (bytes).
    pub fn new(heap_size: u32) -> Self {
        Self {
            heap_size: heap_size as usize,
            allocated: 0,
            strings: Vec::new(),
            string_free_list: Vec::new(),
            string_intern: HashMap::new(),
            objects: Vec::new(),
            object_free_list: Vec::new(),
            arrays: Vec::new(),
            array_free_list: Vec::new(),
            functions: Vec::new(),
            function_free_list: Vec::new(),
        }
    }

    pub fn heap_size(&self) -> usize {
        self.heap_size
    }

    pub fn allocated(&self) -> usize {
        self.allocated
    }

    fn charge(&mut self, size: usize, roots: &[StringHandle]) -> DialResult<()> {
        if self.allocated + size > self.heap_size {
            log::warn!(
                "pool pressure: {} + {} > {}, running string reclamation",
                self.allocated,
                size,
                self.heap_size
            );
            self.reclaim_strings(roots);
            if self.allocated + size > self.heap_size {
                return Err(DialError::out_of_memory(size, self.heap_size.saturating_sub(self.allocated)));
            }
        }
        self.allocated += size;
        Ok(())
    }

    /// Interns a string constant or concatenation/template result. Returns
    /// the existing handle if the content is already interned.
    pub fn intern_string(&mut self, content: &str, roots: &[StringHandle]) -> DialResult<StringHandle> {
        if let Some(handle) = self.string_intern.get(content) {
            return Ok(*handle);
        }

        self.charge(string_size_estimate(content.len()), roots)?;

        let handle = if let Some(index) = self.string_free_list.pop() {
            self.strings[index as usize] = StringSlot::Live(content.to_string());
            StringHandle::new(index)
        } else {
            let index = self.strings.len() as u32;
            self.strings.push(StringSlot::Live(content.to_string()));
            StringHandle::new(index)
        };

        self.string_intern.insert(content.to_string(), handle);
        Ok(handle)
    }

    pub fn get_string(&self, handle: StringHandle) -> Option<&str> {
        match self.strings.get(handle.index() as usize) {
            Some(StringSlot::Live(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Drops every interned string not reachable from `roots`. Safe to call
    /// only between instructions, at `reset()`, or at the end of a callback
    /// — never while roots (operand stack, frame locals, globals,
    /// exception state) might still reference a string about to be freed.
    /// Returns the number of strings actually reclaimed, used to feed the
    /// interpreter's metrics counters.
    pub fn reclaim_strings(&mut self, roots: &[StringHandle]) -> usize {
        let reachable: hashbrown::HashSet<StringHandle> = roots.iter().copied().collect();
        let mut reclaimed = 0usize;

        for (index, slot) in self.strings.iter_mut().enumerate() {
            let handle = StringHandle::new(index as u32);
            if reachable.contains(&handle) {
                continue;
            }
            if let StringSlot::Live(content) = slot {
                let freed = string_size_estimate(content.len());
                self.string_intern.remove(content.as_str());
                self.allocated = self.allocated.saturating_sub(freed);
                reclaimed += 1;
                *slot = StringSlot::Free;
                self.string_free_list.push(index as u32);
            }
        }

        if reclaimed > 0 {
            log::debug!("reclaimed {reclaimed} unreachable interned string(s)");
        }
        reclaimed
    }

    pub fn allocate_object(&mut self, class_name: &str, roots: &[StringHandle]) -> DialResult<ObjectHandle> {
        self.charge(OBJECT_SIZE, roots)?;
        let object = Object::new(class_name);
        let handle = if let Some(index) = self.object_free_list.pop() {
            self.objects[index as usize] = Some(object);
            ObjectHandle::new(index)
        } else {
            let index = self.objects.len() as u32;
            self.objects.push(Some(object));
            ObjectHandle::new(index)
        };
        Ok(handle)
    }

    pub fn get_object(&self, handle: ObjectHandle) -> Option<&Object> {
        self.objects.get(handle.index() as usize)?.as_ref()
    }

    pub fn get_object_mut(&mut self, handle: ObjectHandle) -> Option<&mut Object> {
        self.objects.get_mut(handle.index() as usize)?.as_mut()
    }

    pub fn allocate_array(&mut self, items: Vec<Value>, roots: &[StringHandle]) -> DialResult<ArrayHandle> {
        self.charge(array_size_estimate(items.len()), roots)?;
        let array = Array::from_vec(items);
        let handle = if let Some(index) = self.array_free_list.pop() {
            self.arrays[index as usize] = Some(array);
            ArrayHandle::new(index)
        } else {
            let index = self.arrays.len() as u32;
            self.arrays.push(Some(array));
            ArrayHandle::new(index)
        };
        Ok(handle)
    }

    pub fn get_array(&self, handle: ArrayHandle) -> Option<&Array> {
        self.arrays.get(handle.index() as usize)?.as_ref()
    }

    pub fn get_array_mut(&mut self, handle: ArrayHandle) -> Option<&mut Array> {
        self.arrays.get_mut(handle.index() as usize)?.as_mut()
    }

    pub fn allocate_function(&mut self, function_index: u16, param_count: u8, roots: &[StringHandle]) -> DialResult<FunctionHandle> {
        self.charge(FUNCTION_SIZE, roots)?;
        let function = FunctionRef::new(function_index, param_count);
        let handle = if let Some(index) = self.function_free_list.pop() {
            self.functions[index as usize] = Some(function);
            FunctionHandle::new(index)
        } else {
            let index = self.functions.len() as u32;
            self.functions.push(Some(function));
            FunctionHandle::new(index)
        };
        Ok(handle)
    }

    pub fn get_function(&self, handle: FunctionHandle) -> Option<FunctionRef> {
        self.functions.get(handle.index() as usize)?.as_ref().copied()
    }

    /// The truthiness of a String value requires content lookup: empty
    /// strings are false, everything else is true.
    pub fn is_string_truthy(&self, handle: StringHandle) -> bool {
        self.get_string(handle).map(|s| !s.is_empty()).unwrap_or(false)
    }

    /// Renders any Value to its `to_string` form, used by `ADD`
    /// string-concatenation coercion, `STR_CONCAT`, and `TEMPLATE_FORMAT`.
    pub fn to_display_string(&self, value: Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int32(i) => i.to_string(),
            Value::Float32(f) => {
                if f.is_nan() {
                    "NaN".to_string()
                } else {
                    f.to_string()
                }
            }
            Value::String(h) => self.get_string(h).unwrap_or("").to_string(),
            Value::Object(h) => format!(
                "[object {}]",
                self.get_object(h).map(|o| o.class_name()).unwrap_or("?")
            ),
            Value::Array(h) => format!(
                "[array {}]",
                self.get_array(h).map(|a| a.len()).unwrap_or(0)
            ),
            Value::Function(h) => format!(
                "[function {}]",
                self.get_function(h).map(|f| f.function_index).unwrap_or(0)
            ),
            Value::NativeFn(id) => format!("[native {id}]"),
        }
    }
}
