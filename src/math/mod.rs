mod angle;
mod fixed;
mod tables;

pub use angle::{ANG1, ANG45, ANG90, ANG180, ANG270, ANG_MAX, Angle};
pub use fixed::{
    FRACBITS, FRACUNIT, Fixed, between, f64_to_fixed, fixed_div, fixed_mul, fixed_to_f64,
    int_to_fixed, lerp_fixed, saturate_fixed,
};
pub use tables::{
    ANGLETOFINESHIFT, DBITS, FINEANGLES, FINEMASK, SLOPERANGE, TABLES, delta_to_angle_wide,
    fine_cosine, fine_sine, fine_tangent, point_to_angle, point_to_angle_wide, point_to_dist,
    slope_div, slope_div_wide, tan_to_angle,
};
