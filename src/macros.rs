//! Convenience macros for working with group addresses.

/// Creates a [`GroupAddress`](crate::addressing::GroupAddress) from 3-level notation.
///
/// # Syntax
///
/// ```text
/// ga!(main/middle/sub)
/// ```
///
/// Where:
/// - `main`: Main group (0-31)
/// - `middle`: Middle group (0-7)
/// - `sub`: Sub group (0-255)
///
/// # Examples
///
/// ```
/// use knx_bridge::ga;
///
/// let lamp = ga!(1/2/3);
/// assert_eq!(lamp.to_string(), "1/2/3");
/// ```
///
/// # Compile-Time Validation
///
/// ```compile_fail
/// // main group > 31
/// let addr = knx_bridge::ga!(32/0/0);
/// ```
///
/// ```compile_fail
/// // middle group > 7
/// let addr = knx_bridge::ga!(1/8/0);
/// ```
///
/// # Equivalent Code
///
/// ```
/// use knx_bridge::{ga, GroupAddress};
///
/// assert_eq!(ga!(1/2/3), GroupAddress::new(1, 2, 3).unwrap());
/// ```
#[macro_export]
macro_rules! ga {
    ($main:literal / $middle:literal / $sub:literal) => {{
        const _: () = {
            if $main > 31 {
                panic!("Main group must be 0-31");
            }
            if $middle > 7 {
                panic!("Middle group must be 0-7");
            }
            if $sub > 255 {
                panic!("Sub group must be 0-255");
            }
        };

        // MMMMMIII SSSSSSSS
        const RAW: u16 = (($main & 0x1F) << 11) | (($middle & 0x07) << 8) | ($sub & 0xFF);
        $crate::addressing::GroupAddress::from(RAW)
    }};
}
