#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use futures::executor::block_on;
use product_viewer::{
    config::ViewerConfig,
    context::Renderer,
    data_structures::scene_graph::{MeshData, SceneAsset, SceneNode},
    render::Frame,
    viewer::Viewer,
    viewport::Viewport,
};

use crate::common::test_utils::FakeLoader;

mod common;

const SIZE: u32 = 256;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn headless_renderer(sample_count: u32) -> Renderer {
    block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .expect("No adapter for integration test.");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("No device for integration test.");
        Renderer::new(device, queue, FORMAT, [SIZE, SIZE], sample_count)
    })
}

/// A desktop viewer showing one cube mesh.
fn loaded_viewer(mesh: MeshData) -> Viewer {
    let mut viewer = Viewer::new(ViewerConfig::default());
    let mut root = SceneNode::container("product");
    root.add_child(SceneNode::with_mesh("cube", mesh));
    viewer.resize(Viewport::new(1200.0, 800.0));
    block_on(viewer.load(&FakeLoader::serving(SceneAsset::new(root)))).unwrap();
    viewer
}

fn is_partially_covered(pixel: &image::Rgba<u8>) -> bool {
    pixel.0[3] > 0 && pixel.0[3] < 255
}

/// Draws `frame` offscreen and reads the pixels back.
fn render_to_image(renderer: &Renderer, frame: &Frame) -> image::RgbaImage {
    let texture = renderer.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.queue.submit(std::iter::once(renderer.draw(&view, frame)));

    let u32_size = std::mem::size_of::<u32>() as u32;
    let output_buffer = renderer.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Test Readback"),
        size: (u32_size * SIZE * SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = renderer
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(u32_size * SIZE),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    renderer.queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    renderer.device.poll(wgpu::PollType::Wait).unwrap();
    block_on(rx.receive()).unwrap().unwrap();

    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    image::RgbaImage::from_raw(SIZE, SIZE, data).unwrap()
}

#[test]
fn should_render_transparent_frame_before_load() {
    let renderer = headless_renderer(4);
    let viewer = Viewer::new(ViewerConfig::default());

    let image = render_to_image(&renderer, &viewer.frame());

    for pixel in image.pixels() {
        assert_eq!(*pixel, image::Rgba([0, 0, 0, 0]));
    }
}

#[test]
fn should_render_opaque_model_after_load() {
    let mut renderer = headless_renderer(4);
    let viewer = loaded_viewer(MeshData::cube(1.0));
    renderer.upload(viewer.state().asset().unwrap());

    let image = render_to_image(&renderer, &viewer.frame());

    assert!(renderer.has_model());
    assert!(image.pixels().any(|pixel| pixel.0[3] == 255));
    // the model is pushed left, the right edge stays see-through
    assert_eq!(image.get_pixel(SIZE - 1, SIZE - 1).0[3], 0);
}

#[test]
fn should_smooth_model_edges_when_multisampling() {
    let viewer = loaded_viewer(MeshData::cube(1.0));
    let mut multisampled = headless_renderer(4);
    let mut aliased = headless_renderer(1);
    multisampled.upload(viewer.state().asset().unwrap());
    aliased.upload(viewer.state().asset().unwrap());

    let smooth = render_to_image(&multisampled, &viewer.frame());
    let jagged = render_to_image(&aliased, &viewer.frame());

    // the tilted cube edges only get partial coverage with several samples per pixel
    assert!(smooth.pixels().any(is_partially_covered));
    assert!(!jagged.pixels().any(is_partially_covered));
    assert!(jagged.pixels().any(|pixel| pixel.0[3] == 255));
}

#[test]
fn should_sample_base_colour_texture() {
    let red = Arc::new(image::RgbaImage::from_pixel(
        2,
        2,
        image::Rgba([255, 0, 0, 255]),
    ));
    let cube = MeshData::cube(1.0).with_texture(vec![[0.5, 0.5]; 8], red);
    let mut renderer = headless_renderer(1);
    let viewer = loaded_viewer(cube);
    renderer.upload(viewer.state().asset().unwrap());

    let image = render_to_image(&renderer, &viewer.frame());

    let opaque: Vec<_> = image.pixels().filter(|pixel| pixel.0[3] == 255).collect();
    assert!(!opaque.is_empty());
    for pixel in opaque {
        assert!(pixel.0[0] > 0, "{:?} is not lit", pixel);
        assert_eq!(pixel.0[1], 0, "{:?} is not red", pixel);
        assert_eq!(pixel.0[2], 0, "{:?} is not red", pixel);
    }
}

#[test]
fn should_share_texture_between_meshes_of_one_image() {
    let image = Arc::new(image::RgbaImage::from_pixel(
        1,
        1,
        image::Rgba([0, 255, 0, 255]),
    ));
    let mut root = SceneNode::container("product");
    root.add_child(SceneNode::with_mesh(
        "a",
        MeshData::cube(1.0).with_texture(vec![[0.0, 0.0]; 8], image.clone()),
    ));
    root.add_child(SceneNode::with_mesh(
        "b",
        MeshData::cube(0.5).with_texture(vec![[0.0, 0.0]; 8], image),
    ));
    root.add_child(SceneNode::with_mesh("plain", MeshData::cube(0.25)));
    let mut renderer = headless_renderer(1);

    renderer.upload(&SceneAsset::new(root));

    let model = renderer.model().unwrap();
    assert_eq!(model.meshes.len(), 3);
    // the untextured fallback plus the one shared image
    assert_eq!(model.materials.len(), 2);
    assert_eq!(model.meshes[0].material, model.meshes[1].material);
    assert_eq!(model.meshes[2].material, 0);
}
