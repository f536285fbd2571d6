use crate::{GeometryError, MirrorReflection, Real, RootSelection, Sphere, Surface, Vec3};

/// Where a reflected ray lands on the dome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomeHit {
    /// Display point `E`, relative to the mirror centre.
    pub point: Vec3,
    /// Distance travelled from the mirror to `E`.
    pub distance: Real,
}

/// Follow the reflected ray to the far wall of the dome centred at `dome_center`.
///
/// The mirror sits inside the dome, so the reflected ray starts inside the
/// dome sphere and the largest positive root is the visible hit.
pub fn project_onto_dome(
    reflection: &MirrorReflection,
    dome_center: &Vec3,
    dome_radius: Real,
) -> Result<DomeHit, GeometryError> {
    let dome = Sphere::new(*dome_center, dome_radius);
    let t = dome.hit(
        &reflection.point,
        &reflection.reflected,
        RootSelection::Far,
        Surface::Dome,
    )?;
    Ok(DomeHit {
        point: reflection.point + reflection.reflected * t,
        distance: t,
    })
}
