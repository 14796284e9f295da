//! Typed in-memory tables, one per resource kind.
//!
//! The registry is pure storage and never validates what it stores. Each
//! table preserves insertion order, so listings are deterministic, and sits
//! behind its own lock. Writes spanning several tables go through
//! [`Registry::transaction`], which holds every table's write lock while the
//! caller validates and commits nothing unless the caller succeeds.

use std::fmt;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use paymock_types::{
	ApiError, ApiResult, CheckoutSession, Customer, PaymentIntent, PaymentMethod, Plan, Product,
	Resource, ResourceKind, SetupIntent, Subscription, Token,
};

type Table<T> = RwLock<IndexMap<String, T>>;

/// Resources that own a table in the [`Registry`].
pub trait Stored: Resource + Into<Record> + Send + Sync + 'static {
	#[doc(hidden)]
	fn table(registry: &Registry) -> &Table<Self>;

	#[doc(hidden)]
	fn rows<'v>(view: &'v RegistryView<'_>) -> &'v IndexMap<String, Self>;
}

macro_rules! tables {
	($($ty:ident => $field:ident),* $(,)?) => {
		/// A record of any kind, staged for commit in a [`WriteSet`].
		#[derive(Debug, Clone)]
		pub enum Record {
			$(
				#[allow(missing_docs)]
				$ty($ty),
			)*
		}

		impl Record {
			/// Kind of the staged record.
			pub fn kind(&self) -> ResourceKind {
				match self {
					$( Record::$ty(_) => <$ty as Resource>::KIND, )*
				}
			}

			/// Id of the staged record.
			pub fn id(&self) -> &str {
				match self {
					$( Record::$ty(record) => record.id(), )*
				}
			}
		}

		$(
			impl From<$ty> for Record {
				fn from(record: $ty) -> Self {
					Record::$ty(record)
				}
			}

			impl Stored for $ty {
				fn table(registry: &Registry) -> &Table<Self> {
					&registry.$field
				}

				fn rows<'v>(view: &'v RegistryView<'_>) -> &'v IndexMap<String, Self> {
					view.$field
				}
			}
		)*

		/// In-memory store holding one table per resource kind.
		///
		/// Tables are declared in canonical lock order (see
		/// [`ResourceKind`]); [`Registry::transaction`] acquires them in that
		/// order so concurrent transitions cannot deadlock.
		#[derive(Default)]
		pub struct Registry {
			$( $field: Table<$ty>, )*
		}

		/// Read access to every table while a transaction holds the locks.
		pub struct RegistryView<'a> {
			$( $field: &'a IndexMap<String, $ty>, )*
		}

		struct WriteGuards<'a> {
			$( $field: RwLockWriteGuard<'a, IndexMap<String, $ty>>, )*
		}

		impl Registry {
			// Struct expressions evaluate fields in source order, which is the
			// canonical lock order.
			fn lock_all(&self) -> WriteGuards<'_> {
				WriteGuards {
					$( $field: self.$field.write(), )*
				}
			}

			/// Removes every record from every table.
			pub fn clear(&self) {
				let mut guards = self.lock_all();
				$( guards.$field.clear(); )*
			}

			/// Number of records per kind, in canonical order.
			pub fn counts(&self) -> Vec<(ResourceKind, usize)> {
				vec![ $( (<$ty as Resource>::KIND, self.$field.read().len()), )* ]
			}
		}

		impl WriteGuards<'_> {
			fn view(&self) -> RegistryView<'_> {
				RegistryView {
					$( $field: &*self.$field, )*
				}
			}

			fn apply(&mut self, record: Record) {
				match record {
					$(
						Record::$ty(record) => {
							self.$field.insert(record.id().to_string(), record);
						}
					)*
				}
			}
		}
	};
}

tables! {
	Product => products,
	Plan => plans,
	Customer => customers,
	Token => tokens,
	PaymentMethod => payment_methods,
	PaymentIntent => payment_intents,
	SetupIntent => setup_intents,
	Subscription => subscriptions,
	CheckoutSession => checkout_sessions,
}

impl Registry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a record. A replaced record keeps its position.
	pub fn put<T: Stored>(&self, record: T) {
		let id = record.id().to_string();
		T::table(self).write().insert(id, record);
	}

	/// Fetches a record by id.
	///
	/// # Errors
	///
	/// Returns [`ApiError::NotFound`] naming the resource kind when the id is
	/// unknown.
	pub fn get<T: Stored>(&self, id: &str) -> ApiResult<T> {
		self.find(id).ok_or_else(|| ApiError::not_found(T::KIND, id))
	}

	/// Fetches a record by id, if present.
	pub fn find<T: Stored>(&self, id: &str) -> Option<T> {
		T::table(self).read().get(id).cloned()
	}

	/// Returns true if a record with this id exists.
	pub fn contains<T: Stored>(&self, id: &str) -> bool {
		T::table(self).read().contains_key(id)
	}

	/// Returns matching records in insertion order.
	pub fn list<T: Stored>(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
		T::table(self)
			.read()
			.values()
			.filter(|record| predicate(record))
			.cloned()
			.collect()
	}

	/// Number of stored records of one kind.
	pub fn len<T: Stored>(&self) -> usize {
		T::table(self).read().len()
	}

	/// Runs a multi-table write atomically.
	///
	/// Every table is write-locked (in canonical order) for the duration of
	/// `f`. The closure reads through the [`RegistryView`] and returns the
	/// records to commit together with its result; the [`WriteSet`] is applied
	/// only when it returns `Ok`, so a failing closure leaves every table
	/// untouched.
	///
	/// The closure must not call back into the registry: the locks are not
	/// reentrant.
	pub fn transaction<R>(
		&self,
		f: impl FnOnce(&RegistryView<'_>) -> ApiResult<(WriteSet, R)>,
	) -> ApiResult<R> {
		let mut guards = self.lock_all();
		let (writes, value) = f(&guards.view())?;
		for record in writes.records {
			guards.apply(record);
		}
		Ok(value)
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		for (kind, count) in self.counts() {
			map.entry(&kind.param_name(), &count);
		}
		map.finish()
	}
}

impl<'a> RegistryView<'a> {
	/// Fetches a record by id.
	///
	/// # Errors
	///
	/// Returns [`ApiError::NotFound`] when the id is unknown.
	pub fn get<T: Stored>(&self, id: &str) -> ApiResult<&T> {
		self.find(id).ok_or_else(|| ApiError::not_found(T::KIND, id))
	}

	/// Fetches a record by id, if present.
	pub fn find<T: Stored>(&self, id: &str) -> Option<&T> {
		T::rows(self).get(id)
	}

	/// Resolves an id supplied in request parameter `param`.
	///
	/// # Errors
	///
	/// Returns [`ApiError::NoSuchReference`] (status 400) naming `param` when
	/// the id is unknown, so that no dangling reference is ever stored.
	pub fn reference<T: Stored>(&self, param: &str, id: &str) -> ApiResult<&T> {
		self.find(id).ok_or_else(|| ApiError::no_such(param, id))
	}

	/// Returns true if a record with this id exists.
	pub fn contains<T: Stored>(&self, id: &str) -> bool {
		T::rows(self).contains_key(id)
	}

	/// Iterates one table in insertion order.
	pub fn iter<T: Stored>(&self) -> impl Iterator<Item = &T> {
		T::rows(self).values()
	}
}

/// Records staged by a transaction, committed in order.
#[derive(Debug, Default)]
pub struct WriteSet {
	records: Vec<Record>,
}

impl WriteSet {
	/// Creates an empty write set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stages a record for insertion or replacement.
	pub fn put(&mut self, record: impl Into<Record>) {
		self.records.push(record.into());
	}

	/// Number of staged records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if nothing is staged.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}
