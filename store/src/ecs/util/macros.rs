/// Invoke a macro once for every suffix of the given identifier list.
///
/// `for_each_tuple!(m !! A, B, C)` expands to `m!(A, B, C); m!(B, C); m!(C);`.
#[macro_export]
macro_rules! for_each_tuple {
    ($m:ident !! $last:ident) => {
        $m!($last);
    };
    ($m:ident !! $head:ident, $($tail:ident),*) => (
        $m!($head, $( $tail ),*);
        $crate::for_each_tuple!($m !! $( $tail ),*);
    );
}

/// Apply a macro to every tuple arity from 1 to 16.
#[macro_export]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_each_tuple!($m !! A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
    };
}
