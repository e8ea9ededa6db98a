// hud.rs - optional overlay with the current orientation and key legend

use crate::orientation::{sphere_to_texcoord, texcoord_to_sphere, RotationKey};
use crate::quaternion::{quaternion_to_axis_angle, rotate_vector_by_quaternion, Quaternion};

pub struct HudInfo {
    pub rotation: Quaternion,
    pub fps: f32,
    pub image: String,
    pub texture_size: (u32, u32),
    pub sample_count: u32,
}

fn key_action(key: RotationKey) -> &'static str {
    match key {
        RotationKey::YawLeft => "yaw left",
        RotationKey::YawRight => "yaw right",
        RotationKey::PitchDown => "pitch down",
        RotationKey::PitchUp => "pitch up",
        RotationKey::RollLeft => "roll left",
        RotationKey::RollRight => "roll right",
    }
}

/// "axis (x, y, z) angle N°", or "identity" when there is no rotation.
pub fn describe_rotation(q: Quaternion) -> String {
    match quaternion_to_axis_angle(q) {
        Ok((axis, angle)) => format!(
            "axis ({:.3}, {:.3}, {:.3})  angle {:.1}°",
            axis.x,
            axis.y,
            axis.z,
            angle.to_degrees()
        ),
        Err(_) => "identity".to_string(),
    }
}

/// Panorama longitude/latitude in degrees shown at the middle of the screen.
pub fn view_center(q: Quaternion) -> Option<(f64, f64)> {
    let p = rotate_vector_by_quaternion(q, texcoord_to_sphere(0.5, 0.5)).ok()?;
    let (s, t) = sphere_to_texcoord(p);
    Some((s.rem_euclid(1.0) * 360.0, (t - 0.5) * 180.0))
}

pub fn draw_hud(ctx: &egui::Context, info: &HudInfo) {
    egui::Window::new("Orientation")
        .resizable(false)
        .collapsible(true)
        .default_pos([12.0, 12.0])
        .show(ctx, |ui| {
            let q = info.rotation;
            ui.label(format!(
                "q = ({:.4}, {:.4}, {:.4}, {:.4})",
                q.w, q.x, q.y, q.z
            ));
            ui.label(describe_rotation(q));
            if let Some((lon, lat)) = view_center(q) {
                ui.label(format!("center  lon {lon:.1}°  lat {lat:.1}°"));
            }
            ui.separator();

            ui.label(format!(
                "{}  {}x{}",
                info.image, info.texture_size.0, info.texture_size.1
            ));
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", info.fps)).color(egui::Color32::GREEN),
                );
                if info.sample_count > 1 {
                    ui.label("|");
                    ui.label(format!("MSAA {}x", info.sample_count));
                }
            });
            ui.separator();

            egui::Grid::new("hud_keys").striped(true).show(ui, |ui| {
                for key in RotationKey::ALL {
                    ui.label(key.label());
                    ui.label(key_action(key));
                    ui.end_row();
                }
                ui.label("Left drag");
                ui.label("grab and turn");
                ui.end_row();
                ui.label("F1");
                ui.label("toggle this panel");
                ui.end_row();
                ui.label("Esc");
                ui.label("quit");
                ui.end_row();
            });
        });
}
