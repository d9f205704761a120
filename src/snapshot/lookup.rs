//! Path-based access into nested snapshot groups.
//!
//! Rust has no runtime reflection, so each snapshot group declares its
//! children once through [`impl_field_lookup!`]. The metric catalog resolves
//! every exported series through this one generic getter instead of carrying
//! a hand-written accessor per field.

/// Read access to the numeric leaves of a snapshot group by field path.
///
/// Path segments use the upstream key spelling (`content-length`,
/// `missing-content-length`), not the Rust field names.
pub trait FieldLookup {
    /// Resolves `path` to a leaf value.
    ///
    /// Returns `None` when the path does not end on a leaf of this group:
    /// an unknown key, a path that stops at a sub-group, or one that runs
    /// past a leaf.
    fn lookup<P: AsRef<str>>(&self, path: &[P]) -> Option<f64>;

    /// Walks every leaf below `prefix` in declaration order, calling `visit`
    /// with the leaf's full path and value.
    ///
    /// `prefix` is restored before returning.
    fn visit_leaves(
        &self,
        prefix: &mut Vec<&'static str>,
        visit: &mut dyn FnMut(&[&'static str], f64),
    );

    /// Calls `visit` with the path and value of every leaf of this group.
    fn for_each_leaf(&self, mut visit: impl FnMut(&[&'static str], f64))
    where
        Self: Sized,
    {
        self.visit_leaves(&mut Vec::new(), &mut visit);
    }
}

/// Implements [`FieldLookup`] for a snapshot group.
///
/// ```ignore
/// impl_field_lookup!(Response {
///     "count" => count,
/// } groups {
///     "errors" => errors,
///     "valid" => valid,
/// });
/// ```
macro_rules! impl_field_lookup {
    (
        $ty:ty { $($leaf:literal => $field:ident),* $(,)? }
        $(groups { $($group:literal => $child:ident),* $(,)? })?
    ) => {
        impl $crate::snapshot::FieldLookup for $ty {
            fn lookup<P: AsRef<str>>(&self, path: &[P]) -> Option<f64> {
                let (head, rest) = path.split_first()?;
                match (head.as_ref(), rest.is_empty()) {
                    $(($leaf, true) => Some(self.$field),)*
                    $($(($group, false) => {
                        $crate::snapshot::FieldLookup::lookup(&self.$child, rest)
                    })*)?
                    _ => None,
                }
            }

            fn visit_leaves(
                &self,
                prefix: &mut Vec<&'static str>,
                visit: &mut dyn FnMut(&[&'static str], f64),
            ) {
                $(
                    prefix.push($leaf);
                    visit(prefix.as_slice(), self.$field);
                    prefix.pop();
                )*
                $($(
                    prefix.push($group);
                    $crate::snapshot::FieldLookup::visit_leaves(&self.$child, prefix, visit);
                    prefix.pop();
                )*)?
            }
        }
    };
}

pub(crate) use impl_field_lookup;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Inner {
        hits: f64,
    }

    #[derive(Default)]
    struct Outer {
        total: f64,
        inner: Inner,
    }

    impl_field_lookup!(Inner { "hits" => hits });
    impl_field_lookup!(Outer { "total" => total } groups { "inner" => inner });

    #[test]
    fn test_resolves_leaves_at_any_depth() {
        let outer = Outer {
            total: 4.0,
            inner: Inner { hits: 9.0 },
        };
        assert_eq!(outer.lookup(&["total"]), Some(4.0));
        assert_eq!(outer.lookup(&["inner", "hits"]), Some(9.0));
    }

    #[test]
    fn test_rejects_groups_and_overlong_paths() {
        let outer = Outer::default();
        assert_eq!(outer.lookup(&["inner"]), None);
        assert_eq!(outer.lookup(&["total", "hits"]), None);
        assert_eq!(outer.lookup(&["missing"]), None);
        assert_eq!(outer.lookup::<&str>(&[]), None);
    }

    #[test]
    fn test_visits_every_leaf_with_full_path() {
        let outer = Outer {
            total: 4.0,
            inner: Inner { hits: 9.0 },
        };
        let mut seen = Vec::new();
        outer.for_each_leaf(|path, value| seen.push((path.join("."), value)));
        assert_eq!(
            seen,
            vec![("total".to_string(), 4.0), ("inner.hits".to_string(), 9.0)]
        );
    }

    #[test]
    fn test_visit_restores_prefix() {
        let mut prefix = vec!["outer"];
        let mut paths = Vec::new();
        Outer::default().visit_leaves(&mut prefix, &mut |path, _| paths.push(path.join(".")));
        assert_eq!(prefix, vec!["outer"]);
        assert_eq!(paths, vec!["outer.total", "outer.inner.hits"]);
    }
}
