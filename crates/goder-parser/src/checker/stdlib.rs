//! Signatures of commonly used standard-library members
//!
//! Other packages are never loaded, so a qualified reference normally types
//! as unresolved. This table covers the members that show up most often as
//! arguments to generic functions, so that `Map(strings.Fields(s), f)` can
//! still be bound.

use super::ty::UntypedKind;

/// A known member of a standard-library package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdMember {
    /// A function; the text is a Go function type.
    Func(&'static str),
    /// A typed variable; the text is a Go type.
    Var(&'static str),
    /// An untyped constant.
    Const(UntypedKind),
}

const FUNCS: &[(&str, &str, &str)] = &[
    ("errors", "New", "func(string) error"),
    ("errors", "Is", "func(error, error) bool"),
    ("errors", "Unwrap", "func(error) error"),
    ("fmt", "Errorf", "func(string, ...any) error"),
    ("fmt", "Print", "func(...any) (int, error)"),
    ("fmt", "Printf", "func(string, ...any) (int, error)"),
    ("fmt", "Println", "func(...any) (int, error)"),
    ("fmt", "Sprint", "func(...any) string"),
    ("fmt", "Sprintf", "func(string, ...any) string"),
    ("fmt", "Sprintln", "func(...any) string"),
    ("math", "Abs", "func(float64) float64"),
    ("math", "Ceil", "func(float64) float64"),
    ("math", "Floor", "func(float64) float64"),
    ("math", "Inf", "func(int) float64"),
    ("math", "IsInf", "func(float64, int) bool"),
    ("math", "IsNaN", "func(float64) bool"),
    ("math", "Max", "func(float64, float64) float64"),
    ("math", "Min", "func(float64, float64) float64"),
    ("math", "Mod", "func(float64, float64) float64"),
    ("math", "Pow", "func(float64, float64) float64"),
    ("math", "Round", "func(float64) float64"),
    ("math", "Sqrt", "func(float64) float64"),
    ("math/rand", "Intn", "func(int) int"),
    ("math/rand", "Float64", "func() float64"),
    ("os", "Exit", "func(int)"),
    ("os", "Getenv", "func(string) string"),
    ("os", "ReadFile", "func(string) ([]byte, error)"),
    ("sort", "Ints", "func([]int)"),
    ("sort", "Strings", "func([]string)"),
    ("strconv", "Atoi", "func(string) (int, error)"),
    ("strconv", "FormatBool", "func(bool) string"),
    ("strconv", "FormatFloat", "func(float64, byte, int, int) string"),
    ("strconv", "FormatInt", "func(int64, int) string"),
    ("strconv", "Itoa", "func(int) string"),
    ("strconv", "ParseBool", "func(string) (bool, error)"),
    ("strconv", "ParseFloat", "func(string, int) (float64, error)"),
    ("strconv", "ParseInt", "func(string, int, int) (int64, error)"),
    ("strconv", "Quote", "func(string) string"),
    ("strings", "Contains", "func(string, string) bool"),
    ("strings", "EqualFold", "func(string, string) bool"),
    ("strings", "Fields", "func(string) []string"),
    ("strings", "HasPrefix", "func(string, string) bool"),
    ("strings", "HasSuffix", "func(string, string) bool"),
    ("strings", "Index", "func(string, string) int"),
    ("strings", "Join", "func([]string, string) string"),
    ("strings", "Repeat", "func(string, int) string"),
    ("strings", "Replace", "func(string, string, string, int) string"),
    ("strings", "ReplaceAll", "func(string, string, string) string"),
    ("strings", "Split", "func(string, string) []string"),
    ("strings", "ToLower", "func(string) string"),
    ("strings", "ToUpper", "func(string) string"),
    ("strings", "Trim", "func(string, string) string"),
    ("strings", "TrimSpace", "func(string) string"),
    ("unicode", "IsDigit", "func(rune) bool"),
    ("unicode", "IsLetter", "func(rune) bool"),
    ("unicode", "IsSpace", "func(rune) bool"),
    ("unicode", "IsUpper", "func(rune) bool"),
    ("unicode", "ToLower", "func(rune) rune"),
    ("unicode", "ToUpper", "func(rune) rune"),
];

const VARS: &[(&str, &str, &str)] = &[("os", "Args", "[]string")];

const CONSTS: &[(&str, &str, UntypedKind)] = &[
    ("math", "E", UntypedKind::Float),
    ("math", "MaxFloat64", UntypedKind::Float),
    ("math", "MaxInt", UntypedKind::Int),
    ("math", "MaxInt32", UntypedKind::Int),
    ("math", "MaxInt64", UntypedKind::Int),
    ("math", "MinInt", UntypedKind::Int),
    ("math", "MinInt64", UntypedKind::Int),
    ("math", "Pi", UntypedKind::Float),
    ("math", "SmallestNonzeroFloat64", UntypedKind::Float),
];

/// Look up `member` of the package imported as `path`.
pub fn lookup(path: &str, member: &str) -> Option<StdMember> {
    if let Some((_, _, sig)) = FUNCS.iter().find(|(p, m, _)| *p == path && *m == member) {
        return Some(StdMember::Func(sig));
    }
    if let Some((_, _, ty)) = VARS.iter().find(|(p, m, _)| *p == path && *m == member) {
        return Some(StdMember::Var(ty));
    }
    CONSTS
        .iter()
        .find(|(p, m, _)| *p == path && *m == member)
        .map(|(_, _, kind)| StdMember::Const(*kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_type_text;

    #[test]
    fn test_lookup_known_members() {
        assert_eq!(
            lookup("strconv", "Itoa"),
            Some(StdMember::Func("func(int) string"))
        );
        assert_eq!(lookup("math", "Pi"), Some(StdMember::Const(UntypedKind::Float)));
        assert_eq!(lookup("os", "Args"), Some(StdMember::Var("[]string")));
        assert_eq!(lookup("strconv", "Nope"), None);
        assert_eq!(lookup("github.com/x/y", "Itoa"), None);
    }

    #[test]
    fn test_every_signature_parses() {
        for (path, member, sig) in FUNCS.iter().chain(VARS.iter()) {
            assert!(
                parse_type_text(sig).is_ok(),
                "{}.{} has unparsable type {}",
                path,
                member,
                sig
            );
        }
    }
}
