/// Declare a record type.
///
/// Defines the struct as written and implements [`Record`](crate::Record) and
/// [`Attribute`](crate::Attribute) for it. Each field may be followed by `=> "tag"`, giving the
/// field's tag (see [`parse_tag`](crate::parse_tag)). Untagged fields use their own name and
/// carry no key role.
///
/// ```
/// use dyna_pack::{record, Record};
///
/// record! {
///     #[derive(Clone, Debug)]
///     pub struct Order {
///         pub id: String => "OrderId,HASH",
///         pub placed: u64 => ",RANGE",
///         pub items: Vec<String>,
///     }
/// }
///
/// assert_eq!(Order::NAME, "Order");
/// let fields = Order::fields();
/// assert_eq!(fields[0].tag, "OrderId,HASH");
/// assert_eq!(fields[2].name, "items");
/// ```
#[macro_export]
macro_rules! record {
    (@tag) => { "" };
    (@tag $tag:literal) => { $tag };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Record for $name {
            const NAME: &'static str = ::core::stringify!($name);

            fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                ::std::vec![
                    $(
                        $crate::FieldDef::new::<$fty>(
                            ::core::stringify!($field),
                            $crate::record!(@tag $($tag)?),
                        ),
                    )*
                ]
            }

            fn values(&self) -> ::std::vec::Vec<&dyn $crate::Attribute> {
                ::std::vec![$(&self.$field as &dyn $crate::Attribute,)*]
            }
        }

        impl $crate::Attribute for $name {
            fn shape() -> $crate::Shape {
                $crate::Shape::Record($crate::RecordHandle::of::<Self>())
            }

            fn view(&self) -> $crate::View<'_> {
                $crate::View::Record(<Self as $crate::Record>::values(self))
            }
        }
    };
}
