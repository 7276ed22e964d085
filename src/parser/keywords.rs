//! Keyword-to-builder dispatch: walks the s-expression tree produced by
//! the reader and calls the same `Scene`/primitive/shader builder
//! methods a caller constructing a scene programmatically would use.

use super::Sexpr;
use crate::camera::CameraConfig;
use crate::csg::CsgOp;
use crate::error::ParseError;
use crate::light::Light;
use crate::math::{Color, Matrix, Vec3};
use crate::primitives::Primitive;
use crate::scene::Scene;
use crate::shader::ShaderKind;
use crate::transform::Transform;
use std::path::Path;
use std::sync::Arc;

fn err(path: &Path, message: impl Into<String>) -> ParseError {
    ParseError::UnexpectedToken { path: path.to_path_buf(), line: 0, column: 0, message: message.into() }
}

fn as_symbol<'a>(s: &'a Sexpr) -> Option<&'a str> {
    match s {
        Sexpr::Symbol(s) => Some(s.as_str()),
        _ => None,
    }
}

fn as_number(s: &Sexpr) -> Option<f64> {
    match s {
        Sexpr::Number(n) => Some(*n),
        _ => None,
    }
}

fn as_vec3(items: &[Sexpr]) -> Option<Vec3> {
    if items.len() < 3 {
        return None;
    }
    Some(Vec3::new(as_number(&items[0])?, as_number(&items[1])?, as_number(&items[2])?))
}

/// Walks every top-level form, dispatching on its leading keyword.
/// Unknown keywords at the top level are reported as parse errors;
/// unrecognized keys inside a `(primitive ...)` form's keyword
/// arguments are ignored (forward-compatible extension point), matching
/// the original's permissive keyword-table lookup.
pub fn build_scene(path: &Path, forms: &[Sexpr]) -> Result<Scene, ParseError> {
    let mut scene = Scene::new();
    let mut top_level = Vec::new();
    let mut default_shader = scene.shaders.push(ShaderKind::Solid(Color::fill(0.5)));

    for form in forms {
        let Sexpr::List(items) = form else {
            return Err(err(path, "expected a top-level list form"));
        };
        let Some(Sexpr::Symbol(keyword)) = items.first() else {
            return Err(err(path, "expected a keyword at the head of a list"));
        };
        let args = &items[1..];

        match keyword.as_str() {
            "size" => {
                scene.width = as_number(&args[0]).ok_or_else(|| err(path, "size: expected width"))? as u32;
                scene.height = as_number(&args[1]).ok_or_else(|| err(path, "size: expected height"))? as u32;
            }
            "background" => {
                scene.background = as_vec3(args).ok_or_else(|| err(path, "background: expected r g b"))?;
            }
            "ambient" => {
                scene.ambient = as_vec3(args).ok_or_else(|| err(path, "ambient: expected r g b"))?;
            }
            "camera" => {
                scene.camera = parse_camera(path, args)?;
            }
            "jitter" => {
                scene.sampling.jitter = as_number(&args[0]).ok_or_else(|| err(path, "jitter: expected value"))?;
            }
            "samples" => {
                scene.sampling.samples_x = as_number(&args[0]).ok_or_else(|| err(path, "samples: expected x"))? as u32;
                scene.sampling.samples_y = as_number(&args[1]).ok_or_else(|| err(path, "samples: expected y"))? as u32;
            }
            "max-ray-depth" => {
                scene.sampling.max_ray_depth = as_number(&args[0]).ok_or_else(|| err(path, "max-ray-depth: expected value"))? as u32;
            }
            "light-sun" => {
                let dir = as_vec3(args).ok_or_else(|| err(path, "light-sun: expected direction"))?;
                let color = as_vec3(&args[3..]).unwrap_or(Color::fill(1.0));
                scene.lights.push(Light::Sun { direction: dir, color });
            }
            "light-point" => {
                let pos = as_vec3(args).ok_or_else(|| err(path, "light-point: expected position"))?;
                let color = as_vec3(&args[3..]).unwrap_or(Color::fill(1.0));
                scene.lights.push(Light::Point { position: pos, color });
            }
            "shader-solid" => {
                let color = as_vec3(args).ok_or_else(|| err(path, "shader-solid: expected r g b"))?;
                default_shader = scene.shaders.push(ShaderKind::Solid(color));
            }
            "sphere" | "cube" | "cylinder" | "cone" | "disc" | "plane" | "paraboloid" | "torus" | "prism" => {
                let id = build_primitive(&mut scene, keyword, args, default_shader, path)?;
                top_level.push(id);
            }
            "union" | "intersection" | "difference" => {
                let op = match keyword.as_str() {
                    "union" => CsgOp::Union,
                    "intersection" => CsgOp::Intersection,
                    _ => CsgOp::Difference,
                };
                let mut children = Vec::new();
                for child_form in args {
                    let Sexpr::List(child_items) = child_form else { continue };
                    let Some(child_kw) = child_items.first().and_then(as_symbol) else { continue };
                    let id = build_primitive(&mut scene, child_kw, &child_items[1..], default_shader, path)?;
                    children.push(id);
                }
                let transform = Arc::new({
                    let mut t = Transform::default();
                    t.init(None).map_err(|_| err(path, "singular transform"))?;
                    t
                });
                let id = scene.add_csg(op, children, transform).map_err(|e| err(path, e.to_string()))?;
                top_level.push(id);
            }
            "include" => {
                // Already spliced by the reader before this walk runs.
            }
            other => return Err(err(path, format!("unknown top-level keyword '{other}'"))),
        }
    }

    scene.build_bvh(top_level);
    Ok(scene)
}

fn parse_camera(path: &Path, args: &[Sexpr]) -> Result<CameraConfig, ParseError> {
    let mut cfg = CameraConfig::default();
    let mut i = 0;
    while i < args.len() {
        match as_symbol(&args[i]) {
            Some("eye") => {
                cfg.eye = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "camera eye: expected x y z"))?;
                i += 4;
            }
            Some("coi") => {
                cfg.coi = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "camera coi: expected x y z"))?;
                i += 4;
            }
            Some("vup") => {
                cfg.vup = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "camera vup: expected x y z"))?;
                i += 4;
            }
            Some("fov") => {
                cfg.fov_degrees = as_number(&args[i + 1]).ok_or_else(|| err(path, "camera fov: expected value"))?;
                i += 2;
            }
            Some("aspect") => {
                cfg.aspect = as_number(&args[i + 1]).ok_or_else(|| err(path, "camera aspect: expected value"))?;
                i += 2;
            }
            Some("aperture") => {
                cfg.aperture = as_number(&args[i + 1]).ok_or_else(|| err(path, "camera aperture: expected value"))?;
                i += 2;
            }
            _ => return Err(err(path, "camera: unexpected argument")),
        }
    }
    Ok(cfg)
}

fn build_primitive(
    scene: &mut Scene,
    keyword: &str,
    args: &[Sexpr],
    default_shader: crate::shader::ShaderId,
    path: &Path,
) -> Result<crate::object::ObjectId, ParseError> {
    let primitive = match keyword {
        "sphere" => Primitive::Sphere,
        "cube" => Primitive::Cube,
        "cylinder" => Primitive::Cylinder,
        "cone" => Primitive::Cone,
        "disc" => Primitive::Disc,
        "plane" => Primitive::Plane,
        "paraboloid" => Primitive::Paraboloid,
        "torus" => Primitive::Torus { hole_radius: args.first().and_then(as_number).unwrap_or(0.3) },
        "prism" => Primitive::Prism { sides: args.first().and_then(as_number).unwrap_or(6.0) as u32 },
        other => return Err(err(path, format!("unknown primitive '{other}'"))),
    };

    let mut translate = Vec3::zero();
    let mut scale = Vec3::fill(1.0);
    let mut shader = default_shader;
    let mut i = 0;
    while i < args.len() {
        match as_symbol(&args[i]) {
            Some("at") => {
                translate = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "at: expected x y z"))?;
                i += 4;
            }
            Some("scale") => {
                scale = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "scale: expected x y z"))?;
                i += 4;
            }
            Some("color") => {
                let c = as_vec3(&args[i + 1..]).ok_or_else(|| err(path, "color: expected r g b"))?;
                shader = scene.shaders.push(ShaderKind::Solid(c));
                i += 4;
            }
            _ => {
                // Forward-compatible: ignore unrecognized trailing args.
                i += 1;
            }
        }
    }

    let matrix = Matrix::translation(translate) * Matrix::scale(scale);
    let mut t = Transform::new(matrix);
    t.init(None).map_err(|_| err(path, "singular transform"))?;
    Ok(scene.add_primitive(primitive, Arc::new(t), shader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use std::path::PathBuf;

    #[test]
    fn builds_scene_from_minimal_source() {
        let tokens = crate::parser::tokenizer::tokenize(
            &PathBuf::from("mem.scn"),
            "(size 16 16) (background 0.1 0.1 0.1) (sphere at 0 0 0 color 1 0 0)",
        )
        .unwrap();
        let mut reader_forms = Vec::new();
        let mut pos = 0;
        while pos < tokens.len() {
            let (form, next) = read_one_for_test(&tokens, pos);
            reader_forms.push(form);
            pos = next;
        }
        let scene = build_scene(&PathBuf::from("mem.scn"), &reader_forms).unwrap();
        assert_eq!(scene.width, 16);
        assert_eq!(scene.objects.len(), 1);
        let _ = parser::Sexpr::Number(0.0);
    }

    fn read_one_for_test(tokens: &[super::super::tokenizer::Token], pos: usize) -> (Sexpr, usize) {
        use super::super::tokenizer::TokenKind;
        match &tokens[pos].kind {
            TokenKind::LParen => {
                let mut items = Vec::new();
                let mut p = pos + 1;
                loop {
                    if tokens[p].kind == TokenKind::RParen {
                        p += 1;
                        break;
                    }
                    let (item, next) = read_one_for_test(tokens, p);
                    items.push(item);
                    p = next;
                }
                (Sexpr::List(items), p)
            }
            TokenKind::Number(n) => (Sexpr::Number(*n), pos + 1),
            TokenKind::Str(s) => (Sexpr::Str(s.clone()), pos + 1),
            TokenKind::Symbol(s) => (Sexpr::Symbol(s.clone()), pos + 1),
            TokenKind::RParen => panic!("unexpected ')'"),
        }
    }
}
