use bytemuck::NoUninit;
use wgpu::util::DeviceExt;

use crate::model::PointCloud;

/// One point as the GPU sees it: position plus resolved color.
#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct PointVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

/// Uploaded point cloud: one instance-stepped vertex buffer, one quad per
/// point expanded in the vertex shader.
pub struct CloudBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub count: u32,
}

/// Interleave positions with resolved colors for upload.
pub fn cloud_vertices(cloud: &PointCloud) -> Vec<PointVertex> {
    cloud
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| PointVertex {
            pos: p.to_array(),
            color: cloud.color(i),
        })
        .collect()
}

/// Upload a cloud wholesale. The previous buffer (if any) is dropped by the
/// caller; clouds are replaced, never patched.
pub fn upload_cloud(device: &wgpu::Device, cloud: &PointCloud) -> CloudBuffer {
    let vertices = cloud_vertices(cloud);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Point Cloud Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    CloudBuffer {
        vertex_buffer,
        count: vertices.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AxisConvention, DEFAULT_POINT_COLOR};

    #[test]
    fn test_vertices_resolve_default_color() {
        let bytes: Vec<u8> = [1.0f32, 0.0, 0.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let cloud = PointCloud::from_le_positions(&bytes, AxisConvention::YUp).unwrap();
        let vertices = cloud_vertices(&cloud);
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].pos, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[0].color, DEFAULT_POINT_COLOR);
    }
}
