//! Recursive Whitted-style shading.
//!
//! Each call finds the nearest hit, adds ambient and direct light from every
//! light that is not shadowed, then recurses for mirror, conductor and
//! dielectric materials until the depth budget runs out.

use lucent_core::{Light, Material, MaterialKind};
use lucent_math::{Color, Ray, Vec3};

use crate::config::RenderConfig;
use crate::hittable::{Culling, HitQuery};
use crate::light::sample_light;
use crate::material::{conductor_fresnel, reflect, refract};
use crate::object::ObjectId;
use crate::scene::{RenderScene, SceneHit};

/// Shades rays against a built scene. Cheap to create; holds only borrows.
#[derive(Clone, Copy)]
pub struct Tracer<'a> {
    scene: &'a RenderScene,
    config: &'a RenderConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a RenderScene, config: &'a RenderConfig) -> Self {
        Self { scene, config }
    }

    /// Colour seen along a camera ray.
    pub fn trace(&self, ray: &Ray) -> Color {
        let depth = self.scene.max_recursion_depth;
        self.shade(ray, None, depth)
    }

    /// Colour seen along `ray` with `remaining` recursion levels left.
    ///
    /// `inside` is the dielectric the ray currently travels through; only
    /// that object is intersected and direct lighting is skipped. A miss
    /// paints the background for camera rays and black otherwise.
    pub fn shade(&self, ray: &Ray, inside: Option<ObjectId>, remaining: u32) -> Color {
        let Some(hit) = self.closest_hit(ray, inside) else {
            return if remaining == self.scene.max_recursion_depth {
                self.scene.background_color
            } else {
                Color::ZERO
            };
        };

        let material = self.scene.material_of(hit.object);
        let epsilon = self.scene.shadow_ray_epsilon;
        let point = ray.at(hit.t) + hit.normal * epsilon;

        let mut color = Color::ZERO;
        if inside.is_none() {
            color += self.ambient(material);
            color += self.direct(ray, &hit, material, point);
        }

        if remaining > 0 {
            color += self.recursive(ray, &hit, material, point, inside, remaining - 1);
        }

        if let Some(id) = inside {
            if let MaterialKind::Dielectric {
                absorption_coefficient,
                ..
            } = self.scene.material_of(id).kind
            {
                color *= (-absorption_coefficient * hit.t).exp();
            }
        }

        color
    }

    /// Nearest hit, or the exit point of the object the ray is inside.
    fn closest_hit(&self, ray: &Ray, inside: Option<ObjectId>) -> Option<SceneHit> {
        match inside {
            None => self.scene.intersect(ray, &HitQuery::closest()),
            Some(id) => {
                let query = HitQuery::closest().with_culling(Culling::None);
                let mut hit = self.scene.intersect_object(id, ray, &query)?;
                if ray.direction.dot(hit.normal) > 0.0 {
                    hit.normal = -hit.normal;
                }
                Some(hit)
            }
        }
    }

    fn ambient(&self, material: &Material) -> Color {
        if !self.config.shading.ambient {
            return Color::ZERO;
        }
        self.scene
            .lights
            .iter()
            .filter_map(|light| match light {
                Light::Ambient { intensity } => Some(material.ambient * *intensity),
                _ => None,
            })
            .sum()
    }

    /// Diffuse and specular terms of every unshadowed point and area light.
    fn direct(&self, ray: &Ray, hit: &SceneHit, material: &Material, point: Vec3) -> Color {
        let shading = &self.config.shading;
        if !shading.diffuse && !shading.specular {
            return Color::ZERO;
        }

        let mut color = Color::ZERO;
        for light in &self.scene.lights {
            let Some(sample) = sample_light(light, point, ray.light_sample) else {
                continue;
            };

            let to_light = sample.position - point;
            let distance_squared = to_light.length_squared();
            let Some(light_direction) = to_light.try_normalize() else {
                continue;
            };

            let shadow_ray = ray.spawn(point, light_direction);
            if self.scene.occluded(&shadow_ray, distance_squared.sqrt()) {
                continue;
            }

            let irradiance = sample.intensity / distance_squared;
            if shading.diffuse {
                color += material.diffuse * irradiance * hit.normal.dot(light_direction).max(0.0);
            }
            if shading.specular {
                if let Some(exponent) = material.phong_exponent {
                    let half_vector = (light_direction - ray.direction).normalize_or_zero();
                    color += material.specular
                        * irradiance
                        * hit.normal.dot(half_vector).max(0.0).powf(exponent);
                }
            }
        }
        color
    }

    /// Reflection and refraction; `depth` is the budget of the spawned rays.
    fn recursive(
        &self,
        ray: &Ray,
        hit: &SceneHit,
        material: &Material,
        point: Vec3,
        inside: Option<ObjectId>,
        depth: u32,
    ) -> Color {
        let enabled = &self.config.materials;
        let reflected = || {
            let reflection = ray.spawn(point, reflect(ray.direction, hit.normal));
            self.shade(&reflection, inside, depth)
        };

        match material.kind {
            MaterialKind::Matte => Color::ZERO,
            MaterialKind::Mirror { reflectance } if enabled.mirror => reflected() * reflectance,
            MaterialKind::Conductor {
                reflectance,
                refraction_index,
                absorption_index,
            } if enabled.conductor => {
                let cos_theta = -ray.direction.dot(hit.normal);
                let fresnel = conductor_fresnel(cos_theta, refraction_index, absorption_index);
                reflected() * reflectance * fresnel
            }
            MaterialKind::Dielectric {
                refraction_index, ..
            } if enabled.dielectric => {
                let reflection = reflected();
                let (n1, n2) = match inside {
                    Some(_) => (refraction_index, 1.0),
                    None => (1.0, refraction_index),
                };

                match refract(ray.direction, hit.normal, n1, n2) {
                    Some(refraction) => {
                        let origin = point - 2.0 * self.scene.shadow_ray_epsilon * hit.normal;
                        let transmitted = ray.spawn(origin, refraction.direction);
                        let next_inside = match inside {
                            Some(_) => None,
                            None => Some(hit.object),
                        };
                        let transmission = self.shade(&transmitted, next_inside, depth);
                        reflection * refraction.reflectance
                            + transmission * refraction.transmittance
                    }
                    // Total internal reflection.
                    None => reflection,
                }
            }
            _ => Color::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccelerationConfig;
    use lucent_core::{Geometry, Object, Scene};
    use lucent_math::Transform;

    fn sphere(center: Vec3, radius: f32, material: usize) -> Object {
        Object {
            geometry: Geometry::Sphere {
                center: Vec3::ZERO,
                radius,
            },
            material,
            transform: Transform::translation(center),
            motion_blur: Vec3::ZERO,
        }
    }

    fn floor(material: usize) -> Object {
        Object {
            geometry: Geometry::Triangle {
                vertices: [
                    Vec3::new(-100.0, -1.0, 100.0),
                    Vec3::new(100.0, -1.0, 100.0),
                    Vec3::new(0.0, -1.0, -100.0),
                ],
            },
            material,
            transform: Transform::IDENTITY,
            motion_blur: Vec3::ZERO,
        }
    }

    fn build(scene: Scene) -> RenderScene {
        RenderScene::build(scene, &AccelerationConfig::default())
    }

    /// One matte sphere lit from directly above.
    fn lambert_scene() -> Scene {
        let mut scene = Scene::new("lambert");
        scene.shadow_ray_epsilon = 0.001;
        scene.materials.push(Material::matte(Color::ZERO, Color::ONE));
        scene.objects.push(sphere(Vec3::ZERO, 1.0, 0));
        scene.lights.push(Light::Point {
            position: Vec3::new(0.0, 10.0, 0.0),
            intensity: Color::splat(1000.0),
        });
        scene
    }

    #[test]
    fn test_lambertian_top_of_sphere() {
        let scene = build(lambert_scene());
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        let color = tracer.trace(&ray);

        // The shading point sits epsilon above the surface at y = 1.
        let distance = 9.0 - scene.shadow_ray_epsilon;
        let expected = 1000.0 / (distance * distance);
        assert!((color.x - expected).abs() < 1e-2, "got {}, expected {}", color.x, expected);
        assert_eq!(color.x, color.y);
        assert_eq!(color.y, color.z);
    }

    #[test]
    fn test_primary_miss_is_background_secondary_miss_is_black() {
        let mut scene = lambert_scene();
        scene.background_color = Color::new(10.0, 20.0, 30.0);
        scene.max_recursion_depth = 2;
        let scene = build(scene);
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        let away = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert_eq!(tracer.trace(&away), Color::new(10.0, 20.0, 30.0));
        assert_eq!(tracer.shade(&away, None, 1), Color::ZERO);
    }

    #[test]
    fn test_ambient_only() {
        let mut scene = Scene::new("ambient");
        scene
            .materials
            .push(Material::matte(Color::new(0.5, 1.0, 0.0), Color::ONE));
        scene.objects.push(sphere(Vec3::ZERO, 1.0, 0));
        scene.lights.push(Light::Ambient {
            intensity: Color::splat(20.0),
        });
        scene.lights.push(Light::Ambient {
            intensity: Color::splat(4.0),
        });
        let scene = build(scene);
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert_eq!(tracer.trace(&ray), Color::new(12.0, 24.0, 0.0));

        let mut disabled = RenderConfig::default();
        disabled.shading.ambient = false;
        assert_eq!(Tracer::new(&scene, &disabled).trace(&ray), Color::ZERO);
    }

    #[test]
    fn test_shadowed_point_gets_no_direct_light() {
        let mut scene = lambert_scene();
        // Sphere between the light and the floor below it.
        scene.objects[0] = sphere(Vec3::new(0.0, 3.0, 0.0), 1.0, 0);
        scene.objects.push(floor(0));
        let scene = build(scene);
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, -1.0, -5.0));
        assert_eq!(tracer.trace(&ray), Color::ZERO);

        // Off to the side the floor is lit.
        let lit = Ray::new(Vec3::new(20.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(tracer.trace(&lit).x > 0.0);
    }

    #[test]
    fn test_specular_highlight() {
        let mut scene = lambert_scene();
        scene.materials[0] = Material::matte(Color::ZERO, Color::ZERO)
            .with_specular(Color::ONE, 10.0);
        let scene = build(scene);
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        // Looking down the light direction: N = H, full highlight.
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        let distance = 9.0 - scene.shadow_ray_epsilon;
        let expected = 1000.0 / (distance * distance);
        assert!((tracer.trace(&ray).x - expected).abs() < 1e-2);

        let mut disabled = RenderConfig::default();
        disabled.shading.specular = false;
        assert_eq!(Tracer::new(&scene, &disabled).trace(&ray), Color::ZERO);
    }

    /// Mirror sphere above a lit matte floor, seen from the side.
    fn mirror_scene(max_recursion_depth: u32) -> Scene {
        let mut scene = Scene::new("mirror");
        scene.max_recursion_depth = max_recursion_depth;
        scene.materials.push(
            Material::matte(Color::splat(0.1), Color::splat(0.5)).with_kind(MaterialKind::Mirror {
                reflectance: Color::splat(0.8),
            }),
        );
        scene.materials.push(Material::matte(Color::ZERO, Color::ONE));
        scene.objects.push(sphere(Vec3::ZERO, 0.5, 0));
        scene.objects.push(floor(1));
        scene.lights.push(Light::Ambient {
            intensity: Color::splat(10.0),
        });
        scene.lights.push(Light::Point {
            position: Vec3::new(0.0, 3.0, 3.0),
            intensity: Color::splat(500.0),
        });
        scene
    }

    #[test]
    fn test_zero_depth_returns_direct_lighting_only() {
        // Hits the lower half of the sphere, so the reflection sees the floor.
        let ray = Ray::new(Vec3::new(0.0, -0.25, 5.0), -Vec3::Z);

        let flat = build(mirror_scene(0));
        let config = RenderConfig::default();
        let direct_only = Tracer::new(&flat, &config).trace(&ray);

        // Same hit shaded as plain matte gives the same colour.
        let mut matte = mirror_scene(0);
        matte.materials[0].kind = MaterialKind::Matte;
        let matte = build(matte);
        let expected = Tracer::new(&matte, &config).trace(&ray);
        assert_eq!(direct_only, expected);

        // With one bounce the reflection of the floor is added.
        let deep = build(mirror_scene(1));
        let reflected = Tracer::new(&deep, &config).trace(&ray);
        assert!(reflected.x > direct_only.x);

        let mut no_mirrors = RenderConfig::default();
        no_mirrors.materials.mirror = false;
        assert_eq!(Tracer::new(&deep, &no_mirrors).trace(&ray), direct_only);
    }

    #[test]
    fn test_conductor_weights_reflection_by_fresnel() {
        let mut scene = mirror_scene(1);
        scene.materials[0].kind = MaterialKind::Conductor {
            reflectance: Color::splat(0.8),
            refraction_index: 0.5,
            absorption_index: 2.0,
        };
        let conductor = build(scene);
        let mirror = build(mirror_scene(1));
        let base = build(mirror_scene(0));
        let config = RenderConfig::default();

        let ray = Ray::new(Vec3::new(0.0, -0.25, 5.0), -Vec3::Z);
        let direct = Tracer::new(&base, &config).trace(&ray);
        let mirror_extra = Tracer::new(&mirror, &config).trace(&ray) - direct;
        let conductor_extra = Tracer::new(&conductor, &config).trace(&ray) - direct;

        assert!(conductor_extra.x > 0.0);
        assert!(conductor_extra.x < mirror_extra.x);
    }

    /// Glass sphere in front of a uniformly lit backdrop.
    fn glass_scene(absorption: Color) -> Scene {
        let mut scene = Scene::new("glass");
        scene.max_recursion_depth = 6;
        scene.materials.push(
            Material::matte(Color::ZERO, Color::ZERO).with_kind(MaterialKind::Dielectric {
                absorption_coefficient: absorption,
                refraction_index: 1.5,
            }),
        );
        scene.materials.push(Material::matte(Color::ONE, Color::ZERO));
        scene.objects.push(sphere(Vec3::ZERO, 1.0, 0));
        scene.objects.push(Object {
            geometry: Geometry::Triangle {
                vertices: [
                    Vec3::new(-100.0, -100.0, -5.0),
                    Vec3::new(100.0, -100.0, -5.0),
                    Vec3::new(0.0, 100.0, -5.0),
                ],
            },
            material: 1,
            transform: Transform::IDENTITY,
            motion_blur: Vec3::ZERO,
        });
        scene.lights.push(Light::Ambient {
            intensity: Color::splat(100.0),
        });
        scene
    }

    #[test]
    fn test_dielectric_transmits_backdrop() {
        let scene = build(glass_scene(Color::ZERO));
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        // Straight through the centre: two interfaces at normal incidence,
        // each transmitting 96%.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let color = tracer.trace(&ray);
        assert!(color.x > 90.0, "got {:?}", color);
        assert!(color.x <= 100.0 + 1e-3, "got {:?}", color);
    }

    #[test]
    fn test_dielectric_absorption_attenuates() {
        let clear = build(glass_scene(Color::ZERO));
        let tinted = build(glass_scene(Color::new(0.0, 0.5, 2.0)));
        let config = RenderConfig::default();

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let clear_color = Tracer::new(&clear, &config).trace(&ray);
        let tinted_color = Tracer::new(&tinted, &config).trace(&ray);

        assert!((tinted_color.x - clear_color.x).abs() < 1e-3);
        assert!(tinted_color.y < clear_color.y);
        assert!(tinted_color.z < tinted_color.y);

        // The path inside runs 2 units; Beer's law with a = 0.5 gives e^-1.
        let ratio = tinted_color.y / clear_color.y;
        assert!(ratio < 0.5 && ratio > 0.3, "ratio {}", ratio);
    }

    #[test]
    fn test_disabled_dielectric_is_direct_only() {
        let scene = build(glass_scene(Color::ZERO));
        let mut config = RenderConfig::default();
        config.materials.dielectric = false;

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert_eq!(Tracer::new(&scene, &config).trace(&ray), Color::ZERO);
    }

    #[test]
    fn test_area_light_illuminates() {
        let mut scene = lambert_scene();
        scene.lights[0] = Light::Area {
            position: Vec3::new(0.0, 10.0, 0.0),
            normal: -Vec3::Y,
            size: 1.0,
            radiance: Color::splat(1000.0),
        };
        let scene = build(scene);
        let config = RenderConfig::default();
        let tracer = Tracer::new(&scene, &config);

        // Centre sample: radiance * size² * cos(0) / d².
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        let distance = 9.0 - scene.shadow_ray_epsilon;
        let expected = 1000.0 / (distance * distance);
        assert!((tracer.trace(&ray).x - expected).abs() < 1e-2);
    }
}
