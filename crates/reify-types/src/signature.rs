//! Build descriptors from JVM generic signatures (JVMS 4.7.9.1).
//!
//! Call site generators know the generic signature of every type they instantiate; parsing it
//! here keeps the generated code to a single string literal per descriptor.

use std::collections::HashMap;

use crate::{ClassEnv, ClassKind, Descriptor, ReifyError, Result};

/// Parse a reference type signature such as `Ljava/util/Map<Ljava/lang/String;[I>;`.
pub fn parse_signature(env: &dyn ClassEnv, signature: &str) -> Result<Descriptor> {
    SignatureParser::new(env).parse(signature)
}

/// Signature parser with bindings for type variables (`TT;`).
///
/// An unbound type variable is an error: erasure leaves nothing to reify for it.
pub struct SignatureParser<'env> {
    env: &'env dyn ClassEnv,
    bindings: HashMap<String, Descriptor>,
}

impl<'env> SignatureParser<'env> {
    pub fn new(env: &'env dyn ClassEnv) -> Self {
        Self {
            env,
            bindings: HashMap::new(),
        }
    }

    /// Resolve occurrences of the type variable `name` to `descriptor`.
    pub fn bind(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.bindings.insert(name.into(), descriptor);
        self
    }

    pub fn parse(&self, signature: &str) -> Result<Descriptor> {
        let mut cursor = Cursor {
            signature,
            pos: 0,
        };
        let descriptor = self.parse_type(&mut cursor)?;
        if cursor.pos != signature.len() {
            return Err(cursor.error("trailing characters"));
        }
        Ok(descriptor)
    }

    fn parse_type(&self, cursor: &mut Cursor<'_>) -> Result<Descriptor> {
        let Some(tag) = cursor.bump() else {
            return Err(cursor.error("unexpected end of signature"));
        };
        match tag {
            'L' => self.parse_class_type(cursor),
            '[' => Ok(Descriptor::array(self.parse_type(cursor)?)),
            'T' => {
                let name = cursor.take_until(&[';'])?;
                cursor.expect(';')?;
                self.bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| cursor.error("unbound type variable"))
            }
            base => {
                let name = match base {
                    'B' => "byte",
                    'C' => "char",
                    'D' => "double",
                    'F' => "float",
                    'I' => "int",
                    'J' => "long",
                    'S' => "short",
                    'Z' => "boolean",
                    _ => return Err(cursor.error("unknown type tag")),
                };
                let class = self
                    .env
                    .lookup_class(name)
                    .ok_or_else(|| ReifyError::UnknownClass(name.to_string()))?;
                Ok(Descriptor::class(class))
            }
        }
    }

    fn parse_class_type(&self, cursor: &mut Cursor<'_>) -> Result<Descriptor> {
        let mut binary_name = cursor.take_until(&['<', '.', ';'])?.replace('/', ".");
        let mut current = self.class_segment(cursor, &binary_name)?;

        while cursor.peek() == Some('.') {
            cursor.bump();
            let simple = cursor.take_until(&['<', '.', ';'])?;
            binary_name = format!("{binary_name}${simple}");
            let inner = self.class_segment(cursor, &binary_name)?;
            current = Descriptor::inner_class(current, inner);
        }

        cursor.expect(';')?;
        Ok(current)
    }

    /// One `Name<Args>` segment of a class type signature.
    fn class_segment(&self, cursor: &mut Cursor<'_>, binary_name: &str) -> Result<Descriptor> {
        let class = self
            .env
            .lookup_class(binary_name)
            .ok_or_else(|| ReifyError::UnknownClass(binary_name.to_string()))?;

        if cursor.peek() == Some('<') {
            cursor.bump();
            let mut args = Vec::new();
            while cursor.peek() != Some('>') {
                args.push(self.parse_type_argument(cursor)?);
            }
            cursor.expect('>')?;
            return Descriptor::parameterized(class, args)
                .map_err(|_| cursor.error("empty type argument list"));
        }

        let generic = self.env.class(class).is_some_and(|def| {
            def.is_generic() && !matches!(def.kind, ClassKind::Array { .. })
        });
        Ok(if generic {
            Descriptor::raw(class)
        } else {
            Descriptor::class(class)
        })
    }

    fn parse_type_argument(&self, cursor: &mut Cursor<'_>) -> Result<Descriptor> {
        match cursor.peek() {
            Some('*') => {
                cursor.bump();
                Ok(Descriptor::unbounded_wildcard(self.env))
            }
            Some('+') => {
                cursor.bump();
                Descriptor::wildcard_upper(vec![self.parse_type(cursor)?])
            }
            Some('-') => {
                cursor.bump();
                Descriptor::wildcard_lower(vec![self.parse_type(cursor)?])
            }
            Some(_) => self.parse_type(cursor),
            None => Err(cursor.error("unterminated type argument list")),
        }
    }
}

struct Cursor<'a> {
    signature: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.signature[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            _ => Err(self.error("unexpected character")),
        }
    }

    /// Consume a non-empty run of characters up to (not including) one of `stops`.
    fn take_until(&mut self, stops: &[char]) -> Result<&'a str> {
        let rest = &self.signature[self.pos..];
        let len = rest.find(stops).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn error(&self, reason: &'static str) -> ReifyError {
        ReifyError::InvalidSignature {
            signature: self.signature.to_string(),
            reason,
        }
    }
}
