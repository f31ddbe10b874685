//! Specialization of generic declarations
//!
//! A specialization is a clone of the generic declaration under a fresh
//! name, with its type parameter list removed and every type parameter
//! replaced by the bound type. Expression ids are renumbered so the clone
//! gets its own type information.

use super::substitute::TypeSubstitution;
use crate::naming::Binding;
use goder_parser::ast::*;

/// Specialize a generic function.
pub fn specialize_func(generic: &FuncDecl, name: &str, binding: &Binding) -> Decl {
    let mut func = generic.clone();
    func.name.name = name.to_string();
    func.type_params.clear();
    TypeSubstitution::new(binding).apply_func(&mut func);

    let mut decl = Decl::Func(func);
    renumber(&mut decl);
    decl
}

/// Specialize a generic type.
pub fn specialize_type(generic: &TypeSpec, name: &str, binding: &Binding) -> Decl {
    let mut spec = generic.clone();
    spec.name.name = name.to_string();
    spec.type_params.clear();
    TypeSubstitution::new(binding).apply_type_spec(&mut spec);

    let mut decl = Decl::Type(spec);
    renumber(&mut decl);
    decl
}

/// Specialize a method of a generic type for the instance `type_name`.
///
/// `binding` is keyed by the type's own parameter names (`type_params`);
/// the receiver may rename them (`func (s *Stack[E]) Push(v E)`), so they
/// are matched by position.
pub fn specialize_method(
    generic: &FuncDecl,
    type_name: &str,
    type_params: &[String],
    binding: &Binding,
) -> Decl {
    let mut func = generic.clone();

    let mut method_binding = Binding::new();
    if let Some(recv) = &func.recv {
        for (recv_name, param) in recv.type_param_names().iter().zip(type_params) {
            match binding.get(param) {
                Some(ty) if ty != recv_name => {
                    method_binding.insert(recv_name.clone(), ty.clone());
                }
                _ => {}
            }
        }
    }

    if let Some(recv) = &mut func.recv {
        let instance = TypeExpr::Named(Ident::new(type_name, recv.span));
        recv.ty = match &recv.ty {
            TypeExpr::Pointer(_) => TypeExpr::Pointer(Box::new(instance)),
            _ => instance,
        };
    }
    func.type_params.clear();
    TypeSubstitution::new(&method_binding).apply_func(&mut func);

    let mut decl = Decl::Func(func);
    renumber(&mut decl);
    decl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_func(source: &str) -> FuncDecl {
        let file = goder_parser::parse(source).unwrap();
        file.decls
            .into_iter()
            .find_map(|decl| match decl {
                Decl::Func(func) => Some(func),
                _ => None,
            })
            .unwrap()
    }

    fn render(decl: Decl) -> String {
        let mut file = goder_parser::parse("package main\n").unwrap();
        file.decls.push(decl);
        goder_fmt::render(&file)
    }

    fn binding(pairs: &[(&str, &str)]) -> Binding {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_specialize_func() {
        let generic = first_func(
            "package main\n\nfunc Map[T any, R any](xs []T, f func(T, int) R) []R {\n\treturn nil\n}\n",
        );
        let decl = specialize_func(&generic, "MapAbcdefgh", &binding(&[("T", "int"), ("R", "string")]));
        assert_eq!(
            render(decl),
            "package main\n\nfunc MapAbcdefgh(xs []int, f func(int, int) string) []string {\n\treturn nil\n}\n"
        );
    }

    #[test]
    fn test_specialize_renumbers_expressions() {
        let generic = first_func("package main\n\nfunc Id[T any](x T) T {\n\treturn x\n}\n");
        let Decl::Func(clone) = specialize_func(&generic, "IdX", &binding(&[("T", "int")])) else {
            unreachable!()
        };
        let ids = |f: &FuncDecl| {
            let Some(Stmt::Return { results, .. }) = f.body.as_ref().and_then(|b| b.stmts.first()) else {
                panic!("expected a return statement");
            };
            results[0].id
        };
        assert_ne!(ids(&generic), ids(&clone));
    }

    #[test]
    fn test_specialize_type_and_renamed_receiver() {
        let file = goder_parser::parse(
            "package main

type Stack[T any] struct {
	items []T
}

func (s *Stack[E]) Push(v E) {
	s.items = append(s.items, v)
}
",
        )
        .unwrap();
        let spec = file.types().next().unwrap();
        let method = file.funcs().next().unwrap();
        let b = binding(&[("T", "int")]);

        let ty = specialize_type(spec, "StackQwertyui", &b);
        let method = specialize_method(method, "StackQwertyui", &["T".to_string()], &b);
        assert_eq!(method.names(), vec!["StackQwertyui.Push"]);

        let mut out = goder_parser::parse("package main\n").unwrap();
        out.decls.push(ty);
        out.decls.push(method);
        assert_eq!(
            goder_fmt::render(&out),
            "package main

type StackQwertyui struct {
	items []int
}

func (s *StackQwertyui) Push(v int) {
	s.items = append(s.items, v)
}
"
        );
    }
}
