//! Mutable argument carriers
//!
//! `Before` listeners rewrite a hooked function's arguments through these
//! boxes. An [`EventParam`] holds one argument behind a shared lock: clones
//! point at the same value, so a write made by any listener, by value or by
//! reference, is what the host reads back when it calls the real function.
//!
//! Each carrier is either *numeric* or *opaque*, fixed when it is built:
//!
//! - numeric carriers (`EventParam::numeric`) support `+ - * /` and the
//!   compound forms, and compare equal by value;
//! - opaque carriers (`EventParam::opaque`) accept the same operators but
//!   leave the value untouched, and never compare equal.
//!
//! `==` compares a carrier with a plain value or with another carrier.
//!
//! A slot's lock is only held for the copy in or out, never while caller
//! code runs: [`EventParam::with`] and [`EventParam::with_mut`] work on a
//! copy of the value.
//!
//! Integer arithmetic wraps on overflow. Integer division by zero panics.
//!
//! [`EventParams`] groups one to five carriers into a tuple with named slot
//! accessors (`arg1` .. `arg5`) and bulk read-back.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::Arc;

use parking_lot::Mutex;

/// Arithmetic operation applied to a numeric carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Primitive number types a carrier can do arithmetic on.
pub trait Numeric: Copy + PartialEq + Send + Sync + 'static {
    fn apply(self, op: ArithOp, rhs: Self) -> Self;
}

macro_rules! impl_numeric_int {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn apply(self, op: ArithOp, rhs: Self) -> Self {
                    match op {
                        ArithOp::Add => self.wrapping_add(rhs),
                        ArithOp::Sub => self.wrapping_sub(rhs),
                        ArithOp::Mul => self.wrapping_mul(rhs),
                        ArithOp::Div => self.wrapping_div(rhs),
                    }
                }
            }
        )*
    };
}

macro_rules! impl_numeric_float {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                #[inline]
                fn apply(self, op: ArithOp, rhs: Self) -> Self {
                    match op {
                        ArithOp::Add => self + rhs,
                        ArithOp::Sub => self - rhs,
                        ArithOp::Mul => self * rhs,
                        ArithOp::Div => self / rhs,
                    }
                }
            }
        )*
    };
}

impl_numeric_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_numeric_float!(f32, f64);

fn numeric_apply<T: Numeric>(lhs: &T, op: ArithOp, rhs: &T) -> T {
    lhs.apply(op, *rhs)
}

fn numeric_eq<T: Numeric>(lhs: &T, rhs: &T) -> bool {
    lhs == rhs
}

/// Operations captured for a numeric carrier at construction.
struct NumericOps<T> {
    apply: fn(&T, ArithOp, &T) -> T,
    eq: fn(&T, &T) -> bool,
}

impl<T> Clone for NumericOps<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NumericOps<T> {}

enum ParamKind<T> {
    Numeric(NumericOps<T>),
    Opaque,
}

impl<T> Clone for ParamKind<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ParamKind<T> {}

/// One hook argument behind a shared, mutable box.
pub struct EventParam<T> {
    value: Arc<Mutex<T>>,
    kind: ParamKind<T>,
}

impl<T: Numeric> EventParam<T> {
    /// Carrier with arithmetic and value equality.
    pub fn numeric(value: T) -> Self {
        Self::with_kind(
            value,
            ParamKind::Numeric(NumericOps {
                apply: numeric_apply::<T>,
                eq: numeric_eq::<T>,
            }),
        )
    }
}

impl<T> EventParam<T> {
    /// Carrier whose operators are no-ops.
    pub fn opaque(value: T) -> Self {
        Self::with_kind(value, ParamKind::Opaque)
    }

    fn with_kind(value: T, kind: ParamKind<T>) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            kind,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ParamKind::Numeric(_))
    }

    pub fn set(&self, value: T) {
        *self.value.lock() = value;
    }

    /// Store `value` and hand back the previous one.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.lock(), value)
    }

    /// Whether both carriers share one box.
    pub fn shares_with(&self, other: &EventParam<T>) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Apply `op` in place. Returns `false` (and changes nothing) for opaque
    /// carriers.
    pub fn apply(&self, op: ArithOp, rhs: &T) -> bool {
        match self.kind {
            ParamKind::Numeric(ops) => {
                let mut value = self.value.lock();
                *value = (ops.apply)(&value, op, rhs);
                true
            }
            ParamKind::Opaque => false,
        }
    }

    /// Value equality for numeric carriers; always `false` for opaque ones.
    pub fn value_eq(&self, rhs: &T) -> bool {
        match self.kind {
            ParamKind::Numeric(ops) => (ops.eq)(&self.value.lock(), rhs),
            ParamKind::Opaque => false,
        }
    }
}

impl<T: Clone> EventParam<T> {
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Run `f` against a copy of the current value.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        let value = self.get();
        f(&value)
    }

    /// Edit a copy of the value, then store it back.
    ///
    /// The slot is not locked while `f` runs, so `f` may read or format any
    /// carrier sharing this slot. Writes made through such an alias inside
    /// `f` are overwritten when `f` returns.
    pub fn with_mut<U>(&self, f: impl FnOnce(&mut T) -> U) -> U {
        let mut value = self.get();
        let out = f(&mut value);
        self.set(value);
        out
    }

    /// Carrier-to-carrier equality: both must be numeric and hold equal
    /// values.
    pub fn same_value(&self, other: &EventParam<T>) -> bool {
        if !self.is_numeric() || !other.is_numeric() {
            return false;
        }
        // Read the right-hand side first so two locks are never held at once.
        let rhs = other.get();
        self.value_eq(&rhs)
    }

    /// New, independent carrier of the same kind holding `self op rhs`.
    /// Opaque carriers yield a copy of the current value.
    pub fn derive(&self, op: ArithOp, rhs: &T) -> EventParam<T> {
        let current = self.get();
        let value = match self.kind {
            ParamKind::Numeric(ops) => (ops.apply)(&current, op, rhs),
            ParamKind::Opaque => current,
        };
        Self::with_kind(value, self.kind)
    }
}

impl<T> Clone for EventParam<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            kind: self.kind,
        }
    }
}

impl<T: Numeric> From<T> for EventParam<T> {
    fn from(value: T) -> Self {
        Self::numeric(value)
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for EventParam<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventParam")
            .field("value", &self.get())
            .field("numeric", &self.is_numeric())
            .finish()
    }
}

impl<T: fmt::Display + Clone> fmt::Display for EventParam<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.get(), f)
    }
}

impl<T> PartialEq<T> for EventParam<T> {
    fn eq(&self, other: &T) -> bool {
        self.value_eq(other)
    }
}

impl<T: Clone> PartialEq for EventParam<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

macro_rules! impl_param_ops {
    ($($op_trait:ident $op_fn:ident $assign_trait:ident $assign_fn:ident $op:ident),*) => {
        $(
            impl<T: Clone> $op_trait<T> for EventParam<T> {
                type Output = EventParam<T>;

                fn $op_fn(self, rhs: T) -> EventParam<T> {
                    self.derive(ArithOp::$op, &rhs)
                }
            }

            impl<T: Clone> $op_trait<T> for &EventParam<T> {
                type Output = EventParam<T>;

                fn $op_fn(self, rhs: T) -> EventParam<T> {
                    self.derive(ArithOp::$op, &rhs)
                }
            }

            impl<T> $assign_trait<T> for EventParam<T> {
                fn $assign_fn(&mut self, rhs: T) {
                    self.apply(ArithOp::$op, &rhs);
                }
            }
        )*
    };
}

impl_param_ops!(
    Add add AddAssign add_assign Add,
    Sub sub SubAssign sub_assign Sub,
    Mul mul MulAssign mul_assign Mul,
    Div div DivAssign div_assign Div
);

/// Tuples of one to five [`EventParam`]s.
pub trait ParamSlots: Clone + Send + Sync + 'static {
    /// The plain argument values, as a tuple of the same arity.
    type Values: Clone + Send + 'static;

    const ARITY: usize;

    fn values(&self) -> Self::Values;

    fn set_values(&self, values: Self::Values);
}

/// Argument carrier for one hooked call.
///
/// Built fresh by the host for every call and dropped once the call is done.
/// Clones share the underlying slots.
#[derive(Clone)]
pub struct EventParams<P> {
    slots: P,
}

impl<P: ParamSlots> EventParams<P> {
    pub fn new(slots: P) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &P {
        &self.slots
    }

    pub fn into_slots(self) -> P {
        self.slots
    }

    /// Read every slot back as a plain tuple.
    pub fn values(&self) -> P::Values {
        self.slots.values()
    }

    /// Overwrite every slot.
    pub fn set_values(&self, values: P::Values) {
        self.slots.set_values(values);
    }

    pub fn arity(&self) -> usize {
        P::ARITY
    }
}

impl<P: fmt::Debug> fmt::Debug for EventParams<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventParams").field(&self.slots).finish()
    }
}

macro_rules! param_slots {
    ($arity:expr; $($T:ident $idx:tt $accessor:ident),+) => {
        impl<$($T: Clone + Send + 'static),+> ParamSlots for ($(EventParam<$T>,)+) {
            type Values = ($($T,)+);

            const ARITY: usize = $arity;

            fn values(&self) -> Self::Values {
                ($(self.$idx.get(),)+)
            }

            fn set_values(&self, values: Self::Values) {
                $(self.$idx.set(values.$idx);)+
            }
        }

        impl<$($T: Clone + Send + 'static),+> EventParams<($(EventParam<$T>,)+)> {
            $(
                pub fn $accessor(&self) -> &EventParam<$T> {
                    &self.slots.$idx
                }
            )+
        }
    };
}

param_slots!(1; T1 0 arg1);
param_slots!(2; T1 0 arg1, T2 1 arg2);
param_slots!(3; T1 0 arg1, T2 1 arg2, T3 2 arg3);
param_slots!(4; T1 0 arg1, T2 1 arg2, T3 2 arg3, T4 3 arg4);
param_slots!(5; T1 0 arg1, T2 1 arg2, T3 2 arg3, T4 3 arg4, T5 4 arg5);
