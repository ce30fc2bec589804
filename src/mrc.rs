use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

/// Returned when a weak handle outlived every strong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeError;

impl Display for UpgradeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("object already dropped")
    }
}

impl Error for UpgradeError {}

struct MrcBox<T> {
    strong: Cell<usize>,
    weak: Cell<usize>,
    value: Option<T>,
}

impl<T> MrcBox<T> {
    fn inc_weak(&self) {
        self.weak.set(self.weak.get() + 1);
    }

    fn dec_weak(&self) {
        self.weak.set(self.weak.get() - 1);
    }

    fn inc_strong(&self) {
        self.strong.set(self.strong.get() + 1);
    }

    fn dec_strong(&self) {
        self.strong.set(self.strong.get() - 1);
    }
}

/// Single-threaded shared handle with interior mutability through `DerefMut`.
///
/// Scene nodes point at each other from both directions (parent records,
/// backends holding their owner), so the tree is built out of `Mrc` strong
/// handles downwards and `MrcWeak` handles upwards.
pub struct Mrc<T> {
    ptr: *mut MrcBox<T>,
}

impl<T> PartialEq for Mrc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

pub struct MrcWeak<T> {
    ptr: *mut MrcBox<T>,
}

impl<T> Mrc<T> {
    pub fn new(value: T) -> Self {
        let ptr = Box::into_raw(Box::new(MrcBox {
            strong: Cell::new(1),
            // implicit weak reference shared by all strong ones
            weak: Cell::new(1),
            value: Some(value),
        }));
        Mrc { ptr }
    }

    pub fn as_weak(&self) -> MrcWeak<T> {
        self.inner().inc_weak();
        MrcWeak { ptr: self.ptr }
    }

    pub fn strong_count(&self) -> usize {
        self.inner().strong.get()
    }

    fn inner(&self) -> &MrcBox<T> {
        unsafe { &*self.ptr }
    }
}

impl<T> Deref for Mrc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match unsafe { (*self.ptr).value.as_ref() } {
            Some(v) => v,
            None => unreachable!("value dropped while strongly referenced"),
        }
    }
}

impl<T> DerefMut for Mrc<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match unsafe { (*self.ptr).value.as_mut() } {
            Some(v) => v,
            None => unreachable!("value dropped while strongly referenced"),
        }
    }
}

impl<T> Clone for Mrc<T> {
    fn clone(&self) -> Self {
        self.inner().inc_strong();
        Self { ptr: self.ptr }
    }
}

impl<T> Drop for Mrc<T> {
    fn drop(&mut self) {
        self.inner().dec_strong();
        if self.inner().strong.get() == 0 {
            unsafe {
                let value = (*self.ptr).value.take();
                // dropping the value may release weak handles pointing back here
                drop(value);
                self.inner().dec_weak();
                if self.inner().weak.get() == 0 {
                    let _ = Box::from_raw(self.ptr);
                }
            }
        }
    }
}

impl<T> MrcWeak<T> {
    pub fn upgrade(&self) -> Result<Mrc<T>, UpgradeError> {
        let inner = self.inner();
        if inner.strong.get() == 0 {
            return Err(UpgradeError);
        }
        inner.inc_strong();
        Ok(Mrc { ptr: self.ptr })
    }

    fn inner(&self) -> &MrcBox<T> {
        unsafe { &*self.ptr }
    }
}

impl<T> Clone for MrcWeak<T> {
    fn clone(&self) -> Self {
        self.inner().inc_weak();
        Self { ptr: self.ptr }
    }
}

impl<T> Drop for MrcWeak<T> {
    fn drop(&mut self) {
        self.inner().dec_weak();
        if self.inner().weak.get() == 0 {
            unsafe {
                let _ = Box::from_raw(self.ptr);
            }
        }
    }
}
