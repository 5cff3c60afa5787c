#[allow(unused_macros)]
macro_rules! tvar {
    ($n:expr) => {
        $crate::typing::ty::TyVar($n)
    };
}

#[allow(unused_macros)]
macro_rules! subst {
    {} => ($crate::typing::Subst::new());

    { $($v:expr => $t:expr),+ $(,)? } => {{
        vec![$(($v, $t)),+]
            .into_iter()
            .collect::<$crate::typing::Subst>()
    }};
}
