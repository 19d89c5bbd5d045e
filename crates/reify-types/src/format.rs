//! Java-like rendering of descriptors for diagnostics.
//!
//! The output is deterministic: it only depends on the descriptor and the class names known to
//! the environment, never on allocation addresses or hash ordering.

use std::fmt;

use crate::{ClassEnv, ClassId, Descriptor, MethodTypeArgs, WildcardKind};

/// Render `descriptor` as a single line, e.g. `Map<String, List<Integer>>`, `Outer<T>.Inner`,
/// `String[]` or `? extends Number & Comparable`.
pub fn render(env: &dyn ClassEnv, descriptor: &Descriptor) -> String {
    DescriptorDisplay { env, descriptor }.to_string()
}

/// Render a method witness as `<A, B>`.
pub fn render_method_args(env: &dyn ClassEnv, args: &MethodTypeArgs) -> String {
    let mut out = String::from("<");
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        out.push_str(&render(env, arg));
    }
    out.push('>');
    out
}

/// `Display` adapter pairing a descriptor with the environment that names its classes.
pub struct DescriptorDisplay<'a> {
    pub env: &'a dyn ClassEnv,
    pub descriptor: &'a Descriptor,
}

impl fmt::Display for DescriptorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_descriptor(self.env, self.descriptor, f)
    }
}

fn write_descriptor(
    env: &dyn ClassEnv,
    descriptor: &Descriptor,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match descriptor {
        Descriptor::Class(class) => write_class(env, *class, f),
        Descriptor::Parameterized { raw, args } => {
            write_class(env, *raw, f)?;
            f.write_str("<")?;
            write_list(env, args, ", ", f)?;
            f.write_str(">")
        }
        Descriptor::Raw(class) => {
            write_class(env, *class, f)?;
            f.write_str("<raw type>")
        }
        Descriptor::Array(component) => {
            write_descriptor(env, component, f)?;
            f.write_str("[]")
        }
        Descriptor::InnerClass { outer, inner } => {
            write_descriptor(env, outer, f)?;
            f.write_str(".")?;
            write_descriptor(env, inner, f)
        }
        Descriptor::Intersection(bounds) => write_list(env, bounds, " & ", f),
        Descriptor::Wildcard { kind, bounds } => {
            f.write_str(match kind {
                WildcardKind::Upper => "? extends ",
                WildcardKind::Lower => "? super ",
            })?;
            write_list(env, bounds, " & ", f)
        }
    }
}

fn write_list(
    env: &dyn ClassEnv,
    items: &[Descriptor],
    separator: &str,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(separator)?;
        }
        write_descriptor(env, item, f)?;
    }
    Ok(())
}

fn write_class(env: &dyn ClassEnv, class: ClassId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match env.class(class) {
        Some(def) => f.write_str(def.simple_name()),
        None => write!(f, "<unknown class #{}>", class.to_raw()),
    }
}
